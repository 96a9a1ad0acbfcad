use serde_json::json;
use uuid::Uuid;

use crate::common::{TestApp, routes, uuid_of};

mod upload {
    use super::*;

    #[tokio::test]
    async fn presigned_upload_then_download_round_trip() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let file_key = app.upload_photo(&token).await;

        let created = app.create_pastille_with_key(&token, &file_key).await;
        let url = created["photos"][0]["imageUrl"].as_str().unwrap();

        assert_eq!(app.store.get_presigned(url).unwrap(), b"jpeg bytes".to_vec());
    }

    #[tokio::test]
    async fn upload_url_rejects_keys_that_are_not_uuid_images() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app
            .post_with_token(
                routes::UPLOAD_URL,
                &json!({"fileName": "../etc/passwd", "contentType": "image/jpeg"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "fileName");
    }

    #[tokio::test]
    async fn upload_url_requires_an_image_content_type() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app
            .post_with_token(
                routes::UPLOAD_URL,
                &json!({"fileName": format!("{}.jpg", Uuid::new_v4()), "contentType": "text/html"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "contentType");
    }
}

mod create {
    use super::*;

    #[tokio::test]
    async fn creating_a_pastille_attaches_the_photo_and_awards_experience() {
        let app = TestApp::spawn().await;
        let (token, user_id) = app.create_authenticated_user("a@x.com", "Alice").await;
        let file_key = "00000000-0000-0000-0000-000000000001.jpg";
        app.upload_photo_as(&token, file_key, b"tower".to_vec()).await;

        let res = app
            .post_with_token(
                routes::PASTILLES,
                &json!({
                    "title": "Eiffel Tower",
                    "latitude": 48.8584,
                    "longitude": 2.2945,
                    "fileKey": file_key,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "Create failed: {}", res.text);
        assert_eq!(res.body["title"], "Eiffel Tower");
        assert_eq!(res.body["createdByUserId"], user_id.to_string());
        assert_eq!(res.body["createdByUserName"], "Alice");
        assert_eq!(res.body["ratingCount"], 0);
        let photos = res.body["photos"].as_array().unwrap();
        assert_eq!(photos.len(), 1);
        let image_url = photos[0]["imageUrl"].as_str().unwrap();
        assert!(image_url.starts_with("memory://"));
        assert_eq!(res.body["photoUrl"], image_url);

        let stats = app.get_with_token(routes::MY_STATS, &token).await;
        assert_eq!(stats.body["experience"], 50);
        assert_eq!(stats.body["pastillesCount"], 1);
    }

    #[tokio::test]
    async fn latitude_out_of_range_is_rejected() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app
            .post_with_token(
                routes::PASTILLES,
                &json!({
                    "title": "Nowhere",
                    "latitude": 91.0,
                    "longitude": 0.0,
                    "fileKey": format!("{}.jpg", Uuid::new_v4()),
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "latitude");
    }

    #[tokio::test]
    async fn creating_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::PASTILLES,
                &json!({"title": "x", "latitude": 0.0, "longitude": 0.0, "fileKey": "k"}),
            )
            .await;

        assert_eq!(res.status, 401);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn list_is_public_and_newest_first() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        app.create_pastille(&token, "First").await;
        app.create_pastille(&token, "Second").await;

        let res = app.get_without_token(routes::PASTILLES).await;

        assert_eq!(res.status, 200);
        let titles: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn my_pastilles_only_lists_the_callers_own() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        app.create_pastille(&alice, "Alice's").await;
        app.create_pastille(&bob, "Bob's").await;

        let res = app.get_with_token(routes::MY_PASTILLES, &bob).await;

        assert_eq!(res.status, 200);
        let list = res.body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["title"], "Bob's");
    }

    #[tokio::test]
    async fn unknown_pastille_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::pastille(Uuid::new_v4())).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn owner_can_edit_and_clear_fields() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let created = app.create_pastille(&token, "Old title").await;
        let id = uuid_of(&created["id"]);

        let res = app
            .put_with_token(
                &routes::pastille(id),
                &json!({"title": "New title", "description": "Iron lattice"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "Update failed: {}", res.text);
        assert_eq!(res.body["title"], "New title");
        assert_eq!(res.body["description"], "Iron lattice");

        let res = app
            .put_with_token(&routes::pastille(id), &json!({"description": null}), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "New title");
        assert!(res.body["description"].is_null());
    }

    #[tokio::test]
    async fn only_the_owner_can_edit() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let id = uuid_of(&app.create_pastille(&alice, "Mine").await["id"]);

        let res = app
            .put_with_token(&routes::pastille(id), &json!({"title": "Stolen"}), &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn replacing_the_photo_removes_the_old_object() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let old_key = app.upload_photo(&token).await;
        let created = app.create_pastille_with_key(&token, &old_key).await;
        let id = uuid_of(&created["id"]);
        let new_key = app.upload_photo(&token).await;

        let res = app
            .put_with_token(&routes::pastille_photo(id), &json!({"fileKey": new_key}), &token)
            .await;

        assert_eq!(res.status, 200, "Replace failed: {}", res.text);
        assert!(!app.store.contains(&old_key));
        assert!(app.store.contains(&new_key));
        let photos = res.body["photos"].as_array().unwrap();
        assert_eq!(photos.len(), 1);
        assert!(photos[0]["imageUrl"].as_str().unwrap().contains(&new_key));
    }
}

mod photo_keys {
    use super::*;

    use chrono::Utc;
    use pastille_server::entity::photo;
    use sea_orm::{ActiveModelTrait, Set, SqlErr};

    #[tokio::test]
    async fn key_attached_to_another_pastille_cannot_be_reused() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let key = app.upload_photo(&alice).await;
        app.create_pastille_with_key(&alice, &key).await;

        let res = app
            .post_with_token(
                routes::PASTILLES,
                &json!({
                    "title": "Borrowed",
                    "latitude": 48.8584,
                    "longitude": 2.2945,
                    "fileKey": key,
                }),
                &bob,
            )
            .await;

        assert_eq!(res.status, 409, "Expected conflict: {}", res.text);
        assert!(app.store.contains(&key));
        let stats = app.get_with_token(routes::MY_STATS, &bob).await;
        assert_eq!(stats.body["pastillesCount"], 0);
        assert_eq!(stats.body["experience"], 0);
    }

    #[tokio::test]
    async fn upload_url_is_refused_for_keys_already_taken() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let attached = app.upload_photo(&alice).await;
        app.create_pastille_with_key(&alice, &attached).await;
        let uploaded_only = app.upload_photo(&alice).await;

        for key in [&attached, &uploaded_only] {
            let res = app
                .post_with_token(
                    routes::UPLOAD_URL,
                    &json!({"fileName": key, "contentType": "image/jpeg"}),
                    &bob,
                )
                .await;
            assert_eq!(res.status, 409, "Expected conflict for {key}: {}", res.text);
        }
        assert_eq!(app.store.object(&attached).unwrap().data, b"jpeg bytes".to_vec());
    }

    #[tokio::test]
    async fn replacing_with_a_claimed_key_touches_nothing() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let alice_key = app.upload_photo(&alice).await;
        app.create_pastille_with_key(&alice, &alice_key).await;
        let bob_key = app.upload_photo(&bob).await;
        let bob_pastille = uuid_of(&app.create_pastille_with_key(&bob, &bob_key).await["id"]);

        let res = app
            .put_with_token(
                &routes::pastille_photo(bob_pastille),
                &json!({"fileKey": alice_key}),
                &bob,
            )
            .await;

        assert_eq!(res.status, 409, "Expected conflict: {}", res.text);
        assert!(app.store.contains(&alice_key));
        assert!(app.store.contains(&bob_key));
        let view = app.get_without_token(&routes::pastille(bob_pastille)).await;
        assert!(view.body["photoUrl"].as_str().unwrap().contains(&bob_key));
    }

    #[tokio::test]
    async fn database_refuses_two_rows_for_one_key() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let key = app.upload_photo(&alice).await;
        let id = uuid_of(&app.create_pastille_with_key(&alice, &key).await["id"]);

        let err = photo::ActiveModel {
            id: Set(Uuid::new_v4()),
            file_name: Set(key.clone()),
            file_key: Set(key.clone()),
            pastille_id: Set(id),
            uploaded_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap_err();

        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleting_removes_every_photo_object_and_the_row() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let first_key = app.upload_photo(&token).await;
        let created = app.create_pastille_with_key(&token, &first_key).await;
        let id = uuid_of(&created["id"]);

        let second_key = format!("{}.jpg", Uuid::new_v4());
        app.upload_photo_as(&token, &second_key, b"second".to_vec()).await;
        app.insert_photo(id, &second_key, &second_key).await;
        app.post_with_token(&routes::pastille_rate(id), &json!({"rating": 4}), &bob)
            .await;

        let res = app.delete_with_token(&routes::pastille(id), &token).await;

        assert_eq!(res.status, 204, "Delete failed: {}", res.text);
        assert!(!app.store.contains(&first_key));
        assert!(!app.store.contains(&second_key));
        assert_eq!(app.get_without_token(&routes::pastille(id)).await.status, 404);
        let list = app.get_without_token(routes::PASTILLES).await;
        assert!(list.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_the_owner_can_delete() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let id = uuid_of(&app.create_pastille(&alice, "Mine").await["id"]);

        let res = app.delete_with_token(&routes::pastille(id), &bob).await;

        assert_eq!(res.status, 403);
        assert_eq!(app.get_without_token(&routes::pastille(id)).await.status, 200);
    }
}

mod rating {
    use super::*;

    use pastille_server::error::AppError;
    use pastille_server::services::pastille::insert_rating;

    #[tokio::test]
    async fn each_user_rates_a_pastille_at_most_once() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);

        let res = app
            .post_with_token(&routes::pastille_rate(id), &json!({"rating": 5}), &bob)
            .await;
        assert_eq!(res.status, 200, "Rate failed: {}", res.text);
        assert_eq!(res.body["averageRating"], 5.0);
        assert_eq!(res.body["ratingCount"], 1);

        let again = app
            .post_with_token(&routes::pastille_rate(id), &json!({"rating": 1}), &bob)
            .await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "CONFLICT");

        let view = app.get_without_token(&routes::pastille(id)).await;
        assert_eq!(view.body["averageRating"], 5.0);
        assert_eq!(view.body["ratingCount"], 1);
    }

    #[tokio::test]
    async fn racing_ratings_from_one_user_keep_a_single_row() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);
        let path = routes::pastille_rate(id);

        let (body5, body3, body1) = (
            json!({"rating": 5}),
            json!({"rating": 3}),
            json!({"rating": 1}),
        );
        let (first, second, third) = tokio::join!(
            app.post_with_token(&path, &body5, &bob),
            app.post_with_token(&path, &body3, &bob),
            app.post_with_token(&path, &body1, &bob),
        );

        let mut statuses = vec![first.status, second.status, third.status];
        statuses.sort();
        assert_eq!(statuses, vec![200, 409, 409]);
        let view = app.get_without_token(&routes::pastille(id)).await;
        assert_eq!(view.body["ratingCount"], 1);
    }

    #[tokio::test]
    async fn duplicate_rating_past_the_existence_check_is_a_conflict() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, bob_id) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);
        let res = app
            .post_with_token(&routes::pastille_rate(id), &json!({"rating": 5}), &bob)
            .await;
        assert_eq!(res.status, 200);

        // Second writer whose existence check ran before the first commit.
        let late = insert_rating(&app.db, id, bob_id, 2).await;

        assert!(matches!(late, Err(AppError::Conflict(_))));
        let view = app.get_without_token(&routes::pastille(id)).await;
        assert_eq!(view.body["ratingCount"], 1);
        assert_eq!(view.body["averageRating"], 5.0);
    }

    #[tokio::test]
    async fn average_covers_every_rating() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let id = uuid_of(&app.create_pastille(&alice, "Arc").await["id"]);

        for (i, rating) in [5, 4, 3, 4].into_iter().enumerate() {
            let (token, _) = app
                .create_authenticated_user(&format!("rater{i}@x.com"), &format!("Rater {i}"))
                .await;
            app.post_with_token(&routes::pastille_rate(id), &json!({"rating": rating}), &token)
                .await;
        }

        let view = app.get_without_token(&routes::pastille(id)).await;
        assert_eq!(view.body["averageRating"], 4.0);
        assert_eq!(view.body["ratingCount"], 4);
    }

    #[tokio::test]
    async fn owner_cannot_rate_their_own_pastille() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let id = uuid_of(&app.create_pastille(&alice, "Mine").await["id"]);

        let res = app
            .post_with_token(&routes::pastille_rate(id), &json!({"rating": 5}), &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "rating");
    }

    #[tokio::test]
    async fn rating_outside_one_to_five_is_rejected() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
        let id = uuid_of(&app.create_pastille(&alice, "Mine").await["id"]);

        let res = app
            .post_with_token(&routes::pastille_rate(id), &json!({"rating": 6}), &bob)
            .await;

        assert_eq!(res.status, 400);
    }
}
