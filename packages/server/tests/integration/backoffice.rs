use common::storage::ObjectStore;
use sea_orm::EntityTrait;
use serde_json::json;
use uuid::Uuid;

use pastille_server::entity::photo;

use crate::common::{API_KEY, TestApp, routes, uuid_of, zone_body};

mod api_key {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::BACKOFFICE_STATS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "API_KEY_MISSING");
    }

    #[tokio::test]
    async fn wrong_key_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_api_key(routes::BACKOFFICE_STATS, "not-the-key")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "API_KEY_INVALID");
    }

    #[tokio::test]
    async fn user_tokens_do_not_open_the_back_office() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app.get_with_token(routes::BACKOFFICE_USERS, &token).await;

        assert_eq!(res.status, 401);
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn stats_count_everything_and_round_the_average() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);
        for (i, rating) in [5, 4, 4].into_iter().enumerate() {
            let (token, _) = app
                .create_authenticated_user(&format!("r{i}@x.com"), &format!("Rater {i}"))
                .await;
            app.post_with_token(&routes::pastille_rate(id), &json!({"rating": rating}), &token)
                .await;
        }

        let res = app.get_with_api_key(routes::BACKOFFICE_STATS, API_KEY).await;

        assert_eq!(res.status, 200, "Stats failed: {}", res.text);
        assert_eq!(res.body["totalPastilles"], 1);
        assert_eq!(res.body["totalUsers"], 4);
        assert_eq!(res.body["totalQuizzes"], 0);
        assert_eq!(res.body["averageRating"], 4.33);
    }

    #[tokio::test]
    async fn empty_database_has_zero_average() {
        let app = TestApp::spawn().await;

        let res = app.get_with_api_key(routes::BACKOFFICE_STATS, API_KEY).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["averageRating"], 0.0);
    }

    #[tokio::test]
    async fn recent_activity_mixes_signups_and_pastilles_newest_first() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        app.create_pastille(&alice, "Eiffel Tower").await;

        let res = app
            .get_with_api_key(routes::BACKOFFICE_ACTIVITIES, API_KEY)
            .await;

        assert_eq!(res.status, 200);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["kind"], "PastilleCreated");
        assert_eq!(items[1]["kind"], "UserRegistered");
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn user_listing_and_detail() {
        let app = TestApp::spawn().await;
        let (alice, alice_id) = app.create_authenticated_user("a@x.com", "Alice").await;
        app.create_pastille(&alice, "Eiffel Tower").await;

        let list = app.get_with_api_key(routes::BACKOFFICE_USERS, API_KEY).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body.as_array().unwrap().len(), 1);
        assert_eq!(list.body[0]["email"], "a@x.com");

        let detail = app
            .get_with_api_key(&routes::backoffice_user(alice_id), API_KEY)
            .await;
        assert_eq!(detail.status, 200);
        assert_eq!(detail.body["displayName"], "Alice");
        assert_eq!(detail.body["pastillesCount"], 1);
        assert_eq!(detail.body["zonesCount"], 0);
    }

    #[tokio::test]
    async fn user_without_content_can_be_deleted() {
        let app = TestApp::spawn().await;
        let (_, user_id) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app
            .delete_with_api_key(&routes::backoffice_user(user_id), API_KEY)
            .await;

        assert_eq!(res.status, 204, "Delete failed: {}", res.text);
        assert_eq!(
            app.get_with_api_key(&routes::backoffice_user(user_id), API_KEY)
                .await
                .status,
            404
        );
    }

    #[tokio::test]
    async fn user_owning_pastilles_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let (alice, alice_id) = app.create_authenticated_user("a@x.com", "Alice").await;
        app.create_pastille(&alice, "Eiffel Tower").await;

        let res = app
            .delete_with_api_key(&routes::backoffice_user(alice_id), API_KEY)
            .await;

        assert_eq!(res.status, 409);
    }
}

mod content {
    use super::*;

    #[tokio::test]
    async fn pastille_detail_lists_its_quizzes() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);

        let created = app
            .post_with_api_key(
                routes::BACKOFFICE_QUIZZES,
                &json!({
                    "pastilleId": id,
                    "title": "Capital city",
                    "questionText": "Which city?",
                    "quizType": "MultipleChoice",
                    "answers": ["Paris", "Lyon"],
                    "correctAnswerIndex": 0,
                }),
                API_KEY,
            )
            .await;
        assert_eq!(created.status, 201, "Create quiz failed: {}", created.text);
        assert_eq!(created.body["answers"][0]["isCorrect"], true);

        let summary = app
            .get_with_api_key(routes::BACKOFFICE_PASTILLES, API_KEY)
            .await;
        assert_eq!(summary.body[0]["quizCount"], 1);
        assert_eq!(summary.body[0]["creatorName"], "Alice");

        let detail = app
            .get_with_api_key(&routes::backoffice_pastille(id), API_KEY)
            .await;
        assert_eq!(detail.status, 200);
        assert_eq!(detail.body["title"], "Eiffel Tower");
        assert_eq!(detail.body["quizzes"][0]["answerCount"], 2);

        let quizzes = app
            .get_with_api_key(routes::BACKOFFICE_QUIZZES, API_KEY)
            .await;
        assert_eq!(quizzes.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admin_can_edit_and_delete_any_pastille() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let key = app.upload_photo(&alice).await;
        let id = uuid_of(&app.create_pastille_with_key(&alice, &key).await["id"]);

        let res = app
            .put_with_api_key(
                &routes::backoffice_pastille(id),
                &json!({"title": "Moderated"}),
                API_KEY,
            )
            .await;
        assert_eq!(res.status, 200, "Update failed: {}", res.text);
        assert_eq!(res.body["title"], "Moderated");

        let res = app
            .delete_with_api_key(&routes::backoffice_pastille(id), API_KEY)
            .await;
        assert_eq!(res.status, 204);
        assert!(!app.store.contains(&key));
        assert_eq!(app.get_without_token(&routes::pastille(id)).await.status, 404);
    }

    #[tokio::test]
    async fn admin_creates_zones_on_behalf_of_a_user() {
        let app = TestApp::spawn().await;
        let (_, alice_id) = app.create_authenticated_user("a@x.com", "Alice").await;
        let mut body = zone_body("Latin Quarter");
        body["createdByUserId"] = json!(alice_id);

        let res = app
            .post_with_api_key(routes::BACKOFFICE_ZONES, &body, API_KEY)
            .await;
        assert_eq!(res.status, 201, "Create zone failed: {}", res.text);
        assert_eq!(res.body["createdByUserName"], "Alice");
        let id = uuid_of(&res.body["id"]);

        let res = app
            .put_with_api_key(&routes::backoffice_zone(id), &zone_body("Marais"), API_KEY)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Marais");

        let res = app
            .delete_with_api_key(&routes::backoffice_zone(id), API_KEY)
            .await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn zone_for_an_unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let mut body = zone_body("Latin Quarter");
        body["createdByUserId"] = json!(Uuid::new_v4());

        let res = app
            .post_with_api_key(routes::BACKOFFICE_ZONES, &body, API_KEY)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod maintenance {
    use super::*;

    #[tokio::test]
    async fn legacy_photos_get_generated_keys() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let pastille_id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);

        app.store
            .put("legacy-tower.jpg", b"old bytes".to_vec(), "image/jpeg")
            .await
            .unwrap();
        let legacy = app.insert_photo(pastille_id, "legacy-tower.jpg", "").await;
        let orphan = app.insert_photo(pastille_id, "gone.jpg", "").await;

        let res = app
            .post_with_api_key(routes::FIX_PHOTO_KEYS, &json!({}), API_KEY)
            .await;

        assert_eq!(res.status, 200, "Repair failed: {}", res.text);
        assert_eq!(res.body["scanned"], 2);
        assert_eq!(res.body["fixed"], 1);
        assert_eq!(res.body["failed"], 1);

        let fixed = photo::Entity::find_by_id(legacy)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fixed.file_key, format!("{legacy}.jpg"));
        assert!(!app.store.contains("legacy-tower.jpg"));
        assert_eq!(
            app.store.object(&fixed.file_key).unwrap().data,
            b"old bytes".to_vec()
        );

        let untouched = photo::Entity::find_by_id(orphan)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(untouched.file_key.is_empty());

        let rerun = app
            .post_with_api_key(routes::FIX_PHOTO_KEYS, &json!({}), API_KEY)
            .await;
        assert_eq!(rerun.body["scanned"], 1);
        assert_eq!(rerun.body["fixed"], 0);
    }

    #[tokio::test]
    async fn interrupted_repair_is_finished_on_the_next_run() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
        let pastille_id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);
        let legacy = app.insert_photo(pastille_id, "legacy-tower.jpg", "").await;

        // Object already moved, row never updated.
        let moved_key = format!("{legacy}.jpg");
        app.store
            .put(&moved_key, b"old bytes".to_vec(), "image/jpeg")
            .await
            .unwrap();

        let res = app
            .post_with_api_key(routes::FIX_PHOTO_KEYS, &json!({}), API_KEY)
            .await;

        assert_eq!(res.status, 200, "Repair failed: {}", res.text);
        assert_eq!(res.body["fixed"], 1);
        assert_eq!(res.body["failed"], 0);
        let fixed = photo::Entity::find_by_id(legacy)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fixed.file_key, moved_key);
        assert_eq!(app.store.object(&moved_key).unwrap().data, b"old bytes".to_vec());
    }
}
