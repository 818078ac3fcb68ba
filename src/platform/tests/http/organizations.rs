#[cfg(test)]
mod tests {
    use reqwest::Client;
    use reqwest::RequestBuilder;
    use reqwest::StatusCode;
    use serde_json::json;
    use serde_json::Value;
    use tokio::task::JoinSet;

    use crate::assert_response_json_eq;
    use crate::assert_response_status_eq;
    use crate::tests::run_http_service;

    async fn send(req: RequestBuilder) -> (StatusCode, Value) {
        let resp = req.send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn create(cl: &Client, base_url: &str, name: &str, parent_id: Option<i64>) -> i64 {
        let (status, body) = send(
            cl.post(format!("{base_url}/organization"))
                .json(&json!({"name": name, "parent_id": parent_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        body["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_organizations() {
        let (base_url, _md) = run_http_service().await.unwrap();
        let cl = Client::new();

        // list empty
        {
            let resp = cl
                .get(format!("{base_url}/organizations"))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_response_json_eq!(resp, json!([]));
        }

        // create root
        let root_id = {
            let (status, body) = send(
                cl.post(format!("{base_url}/organization"))
                    .json(&json!({"name": "root"})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let id = body["data"]["id"].as_i64().unwrap();
            assert_eq!(
                body,
                json!({"data": {"id": id, "name": "root", "parent_id": null, "children": null}})
            );
            id
        };

        // create child
        let child_id = {
            let (status, body) = send(
                cl.post(format!("{base_url}/organization"))
                    .json(&json!({"name": "child", "parent_id": root_id})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["parent_id"], root_id);
            assert_eq!(body["data"]["children"], Value::Null);
            body["data"]["id"].as_i64().unwrap()
        };
        let grandchild_id = create(&cl, &base_url, "grandchild", Some(child_id)).await;

        // read returns direct children only
        {
            let (status, body) = send(cl.get(format!("{base_url}/organization/{root_id}"))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                body,
                json!({"data": {
                    "id": root_id,
                    "name": "root",
                    "parent_id": null,
                    "children": [
                        {"id": child_id, "name": "child", "parent_id": root_id, "children": null}
                    ]
                }})
            );
        }

        // leaf reads with an empty children array
        {
            let (status, body) =
                send(cl.get(format!("{base_url}/organization/{grandchild_id}"))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["children"], json!([]));
        }

        // update name
        {
            let (status, body) = send(
                cl.put(format!("{base_url}/organization/{child_id}"))
                    .json(&json!({"name": "renamed"})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(
                body,
                json!({"data": {"id": child_id, "name": "renamed", "parent_id": root_id}})
            );
        }

        // update with the current parent is accepted
        {
            let (status, body) = send(
                cl.put(format!("{base_url}/organization/{child_id}"))
                    .json(&json!({"name": "renamed again", "parent_id": root_id})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["data"]["name"], "renamed again");
        }

        // list is flat
        {
            let (status, body) = send(cl.get(format!("{base_url}/organizations"))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                body,
                json!([
                    {"id": root_id, "name": "root", "parent_id": null},
                    {"id": child_id, "name": "renamed again", "parent_id": root_id},
                    {"id": grandchild_id, "name": "grandchild", "parent_id": child_id},
                ])
            );
        }

        // delete the middle node takes its subtree
        {
            let (status, body) =
                send(cl.delete(format!("{base_url}/organization/{child_id}"))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({}));

            let (_, body) = send(cl.get(format!("{base_url}/organizations"))).await;
            assert_eq!(
                body,
                json!([{"id": root_id, "name": "root", "parent_id": null}])
            );

            let resp = cl
                .get(format!("{base_url}/organization/{grandchild_id}"))
                .send()
                .await
                .unwrap();
            assert_response_status_eq!(resp, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_max_depth() {
        let (base_url, _md) = run_http_service().await.unwrap();
        let cl = Client::new();

        let a = create(&cl, &base_url, "A", None).await;
        let b = create(&cl, &base_url, "B", Some(a)).await;
        let c = create(&cl, &base_url, "C", Some(b)).await;
        let d = create(&cl, &base_url, "D", Some(c)).await;
        let e = create(&cl, &base_url, "E", Some(d)).await;

        let (status, body) = send(
            cl.post(format!("{base_url}/organization"))
                .json(&json!({"name": "F", "parent_id": e})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": {"status": 400, "message": "Maximum nodes 5 level"}})
        );

        // a node below the limit still accepts children
        create(&cl, &base_url, "D2", Some(c)).await;

        let (_, body) = send(cl.get(format!("{base_url}/organizations"))).await;
        assert_eq!(body.as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_cascade_delete() {
        let (base_url, md) = run_http_service().await.unwrap();
        let cl = Client::new();

        let a = create(&cl, &base_url, "A", None).await;
        let b = create(&cl, &base_url, "B", Some(a)).await;
        let c = create(&cl, &base_url, "C", Some(b)).await;
        let d = create(&cl, &base_url, "D", Some(c)).await;
        create(&cl, &base_url, "E", Some(d)).await;

        let (status, _) = send(cl.delete(format!("{base_url}/organization/{a}"))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(cl.get(format!("{base_url}/organizations"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(cl.get(format!("{base_url}/organization/{b}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["status"], 404);

        // rows are kept with a deletion mark
        let mut tx = md.begin().await.unwrap();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organizations WHERE deleted_at IS NOT NULL",
        )
        .fetch_one(&mut *tx)
        .await
        .unwrap();
        assert_eq!(count, 5);
        drop(tx);

        // deleting again, or deleting an unknown id, is not an error
        let (status, body) = send(cl.delete(format!("{base_url}/organization/{a}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
        let resp = cl
            .delete(format!("{base_url}/organization/12345"))
            .send()
            .await
            .unwrap();
        assert_response_status_eq!(resp, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validation() {
        let (base_url, _md) = run_http_service().await.unwrap();
        let cl = Client::new();

        // missing name
        let (status, body) = send(
            cl.post(format!("{base_url}/organization"))
                .json(&json!({"parent_id": null})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["fields"]["name"], "missing");

        // empty name
        let (status, body) = send(
            cl.post(format!("{base_url}/organization"))
                .json(&json!({"name": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": {
                "status": 400,
                "message": "invalid fields",
                "fields": {"name": "must not be empty"}
            }})
        );

        // wrong type
        let (status, _) = send(
            cl.post(format!("{base_url}/organization"))
                .json(&json!({"name": "a", "parent_id": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // malformed path id
        let resp = cl
            .get(format!("{base_url}/organization/abc"))
            .send()
            .await
            .unwrap();
        assert_response_status_eq!(resp, StatusCode::BAD_REQUEST);
        let resp = cl
            .delete(format!("{base_url}/organization/abc"))
            .send()
            .await
            .unwrap();
        assert_response_status_eq!(resp, StatusCode::BAD_REQUEST);

        // unknown parent
        let (status, body) = send(
            cl.post(format!("{base_url}/organization"))
                .json(&json!({"name": "orphan", "parent_id": 999})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["status"], 404);

        // nothing was written
        let (_, body) = send(cl.get(format!("{base_url}/organizations"))).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_update() {
        let (base_url, _md) = run_http_service().await.unwrap();
        let cl = Client::new();

        let a = create(&cl, &base_url, "A", None).await;
        let b = create(&cl, &base_url, "B", None).await;
        let a1 = create(&cl, &base_url, "A1", Some(a)).await;

        // moving a node under another parent is rejected
        let (status, body) = send(
            cl.put(format!("{base_url}/organization/{a1}"))
                .json(&json!({"name": "A1", "parent_id": b})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "re-parenting is not supported");

        // turning a child into a root is re-parenting too
        let (status, _) = send(
            cl.put(format!("{base_url}/organization/{a1}"))
                .json(&json!({"name": "A1", "parent_id": null})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // an explicit null on a root keeps it a root
        let (status, body) = send(
            cl.put(format!("{base_url}/organization/{b}"))
                .json(&json!({"name": "B2", "parent_id": null})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({"data": {"id": b, "name": "B2", "parent_id": null}})
        );

        // validation
        let (status, body) = send(
            cl.put(format!("{base_url}/organization/{a1}"))
                .json(&json!({"name": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["fields"]["name"], "must not be empty");

        // missing and deleted rows
        let (status, _) = send(
            cl.put(format!("{base_url}/organization/999"))
                .json(&json!({"name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(cl.delete(format!("{base_url}/organization/{a}"))).await;
        let (status, _) = send(
            cl.put(format!("{base_url}/organization/{a1}"))
                .json(&json!({"name": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // the failed updates left the tree intact
        let (_, body) = send(cl.get(format!("{base_url}/organization/{b}"))).await;
        assert_eq!(body["data"]["name"], "B2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_writes() {
        let (base_url, _md) = run_http_service().await.unwrap();
        let cl = Client::new();

        let root = create(&cl, &base_url, "root", None).await;

        // parallel creates under one parent
        let mut set = JoinSet::new();
        for i in 0..32 {
            let cl = cl.clone();
            let base_url = base_url.clone();
            set.spawn(async move { create(&cl, &base_url, &format!("n{i}"), Some(root)).await });
        }
        let mut children = vec![];
        while let Some(res) = set.join_next().await {
            children.push(res.unwrap());
        }
        children.sort();
        children.dedup();
        assert_eq!(children.len(), 32);

        let (status, body) = send(cl.get(format!("{base_url}/organization/{root}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["children"].as_array().unwrap().len(), 32);

        // every child gets a subtree of its own
        for (i, child) in children.iter().enumerate() {
            let g = create(&cl, &base_url, &format!("g{i}"), Some(*child)).await;
            create(&cl, &base_url, &format!("gg{i}"), Some(g)).await;
        }

        // parallel deletes of sibling subtrees mixed with renames
        let mut set = JoinSet::new();
        for child in children.iter().copied() {
            let cl = cl.clone();
            let base_url = base_url.clone();
            set.spawn(async move {
                let (status, body) =
                    send(cl.delete(format!("{base_url}/organization/{child}"))).await;
                assert_eq!(status, StatusCode::OK, "{body}");
            });
        }
        for i in 0..8 {
            let cl = cl.clone();
            let base_url = base_url.clone();
            set.spawn(async move {
                let (status, body) = send(
                    cl.put(format!("{base_url}/organization/{root}"))
                        .json(&json!({"name": format!("root{i}")})),
                )
                .await;
                assert_eq!(status, StatusCode::CREATED, "{body}");
            });
        }
        while let Some(res) = set.join_next().await {
            res.unwrap();
        }

        let (status, body) = send(cl.get(format!("{base_url}/organizations"))).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], root);
    }
}
