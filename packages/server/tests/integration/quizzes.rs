use serde_json::{Value, json};
use uuid::Uuid;

use crate::common::{TestApp, routes, uuid_of};

fn capital_quiz() -> Value {
    json!({
        "title": "Capital city",
        "questionText": "Which city is this tower in?",
        "explanation": "Built for the 1889 World's Fair in Paris.",
        "quizType": "MultipleChoice",
        "answers": ["Paris", "Lyon", "Nice"],
        "correctAnswerIndex": 0,
    })
}

fn answer_id(quiz: &Value, text: &str) -> Uuid {
    let answer = quiz["answers"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["text"] == text)
        .unwrap_or_else(|| panic!("No answer {text} in {quiz}"));
    uuid_of(&answer["id"])
}

/// Alice owns a pastille with the capital quiz; Bob is a second player.
async fn setup(app: &TestApp) -> (String, String, Uuid, Value) {
    let (alice, _) = app.create_authenticated_user("a@x.com", "Alice").await;
    let (bob, _) = app.create_authenticated_user("b@x.com", "Bobby").await;
    let pastille_id = uuid_of(&app.create_pastille(&alice, "Eiffel Tower").await["id"]);

    let res = app
        .post_with_token(&routes::quizzes(pastille_id), &capital_quiz(), &alice)
        .await;
    assert_eq!(res.status, 201, "Create quiz failed: {}", res.text);

    (alice, bob, pastille_id, res.body)
}

mod authoring {
    use super::*;

    #[tokio::test]
    async fn owner_sees_the_solution_but_players_do_not() {
        let app = TestApp::spawn().await;
        let (_, bob, pastille_id, quiz) = setup(&app).await;
        let quiz_id = uuid_of(&quiz["id"]);

        assert_eq!(quiz["answers"][0]["isCorrect"], true);
        assert_eq!(quiz["answers"][1]["isCorrect"], false);

        let public = app
            .get_with_token(&routes::quiz(pastille_id, quiz_id), &bob)
            .await;
        assert_eq!(public.status, 200);
        assert_eq!(public.body["answers"].as_array().unwrap().len(), 3);
        assert!(public.body["answers"][0].get("isCorrect").is_none());
        assert!(public.body["explanation"].is_null());
    }

    #[tokio::test]
    async fn listing_returns_quizzes_of_the_pastille() {
        let app = TestApp::spawn().await;
        let (_, _, pastille_id, quiz) = setup(&app).await;

        let res = app.get_without_token(&routes::quizzes(pastille_id)).await;

        assert_eq!(res.status, 200);
        let list = res.body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], quiz["id"]);
    }

    #[tokio::test]
    async fn listing_quizzes_of_an_unknown_pastille_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&routes::quizzes(Uuid::new_v4()))
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn only_the_pastille_owner_can_add_quizzes() {
        let app = TestApp::spawn().await;
        let (_, bob, pastille_id, _) = setup(&app).await;

        let res = app
            .post_with_token(&routes::quizzes(pastille_id), &capital_quiz(), &bob)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn multiple_choice_needs_a_valid_correct_index() {
        let app = TestApp::spawn().await;
        let (alice, _, pastille_id, _) = setup(&app).await;
        let mut body = capital_quiz();
        body["correctAnswerIndex"] = json!(7);

        let res = app
            .post_with_token(&routes::quizzes(pastille_id), &body, &alice)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn true_false_quiz_gets_fixed_answers() {
        let app = TestApp::spawn().await;
        let (alice, _, pastille_id, _) = setup(&app).await;

        let res = app
            .post_with_token(
                &routes::quizzes(pastille_id),
                &json!({
                    "title": "Height",
                    "questionText": "Is the tower over 300 m tall?",
                    "quizType": "TrueFalse",
                    "correctAnswerIndex": 0,
                }),
                &alice,
            )
            .await;

        assert_eq!(res.status, 201, "Create failed: {}", res.text);
        let texts: Vec<&str> = res.body["answers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["True", "False"]);
        assert_eq!(res.body["answers"][0]["isCorrect"], true);
    }

    #[tokio::test]
    async fn updating_answers_replaces_them() {
        let app = TestApp::spawn().await;
        let (alice, _, pastille_id, quiz) = setup(&app).await;
        let quiz_id = uuid_of(&quiz["id"]);

        let res = app
            .put_with_token(
                &routes::quiz(pastille_id, quiz_id),
                &json!({"answers": ["Marseille", "Paris"], "correctAnswerIndex": 1}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 200, "Update failed: {}", res.text);
        let answers = res.body["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[1]["text"], "Paris");
        assert_eq!(answers[1]["isCorrect"], true);
        assert_eq!(res.body["title"], "Capital city");
    }

    #[tokio::test]
    async fn deleting_a_quiz_removes_it() {
        let app = TestApp::spawn().await;
        let (alice, _, pastille_id, quiz) = setup(&app).await;
        let quiz_id = uuid_of(&quiz["id"]);

        let res = app
            .delete_with_token(&routes::quiz(pastille_id, quiz_id), &alice)
            .await;

        assert_eq!(res.status, 204);
        let res = app
            .get_without_token(&routes::quiz(pastille_id, quiz_id))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn quiz_is_not_reachable_through_another_pastille() {
        let app = TestApp::spawn().await;
        let (alice, _, _, quiz) = setup(&app).await;
        let other = uuid_of(&app.create_pastille(&alice, "Louvre").await["id"]);

        let res = app
            .get_without_token(&routes::quiz(other, uuid_of(&quiz["id"])))
            .await;

        assert_eq!(res.status, 404);
    }
}

mod attempts {
    use super::*;

    use chrono::Utc;
    use pastille_server::entity::user_quiz_attempt;
    use pastille_server::error::AppError;
    use pastille_server::services::quiz::insert_attempt;
    use sea_orm::Set;

    #[tokio::test]
    async fn correct_answer_awards_experience_once() {
        let app = TestApp::spawn().await;
        let (_, bob, pastille_id, quiz) = setup(&app).await;
        let quiz_id = uuid_of(&quiz["id"]);
        let paris = answer_id(&quiz, "Paris");

        let res = app
            .post_with_token(
                &routes::quiz_attempt(pastille_id, quiz_id),
                &json!({"selectedAnswerId": paris}),
                &bob,
            )
            .await;

        assert_eq!(res.status, 200, "Attempt failed: {}", res.text);
        assert_eq!(res.body["wasCorrect"], true);
        assert_eq!(res.body["experienceGained"], 25);
        assert_eq!(res.body["correctAnswerId"], paris.to_string());
        assert_eq!(
            res.body["explanation"],
            "Built for the 1889 World's Fair in Paris."
        );

        let stats = app.get_with_token(routes::MY_STATS, &bob).await;
        assert_eq!(stats.body["experience"], 25);
        assert_eq!(stats.body["quizAttempts"], 1);
        assert_eq!(stats.body["correctAttempts"], 1);

        let again = app
            .post_with_token(
                &routes::quiz_attempt(pastille_id, quiz_id),
                &json!({"selectedAnswerId": paris}),
                &bob,
            )
            .await;
        assert_eq!(again.status, 409);

        let stats = app.get_with_token(routes::MY_STATS, &bob).await;
        assert_eq!(stats.body["experience"], 25);
    }

    #[tokio::test]
    async fn racing_attempts_record_exactly_one() {
        let app = TestApp::spawn().await;
        let (_, bob, pastille_id, quiz) = setup(&app).await;
        let path = routes::quiz_attempt(pastille_id, uuid_of(&quiz["id"]));
        let body = json!({"selectedAnswerId": answer_id(&quiz, "Paris")});

        let (first, second) = tokio::join!(
            app.post_with_token(&path, &body, &bob),
            app.post_with_token(&path, &body, &bob),
        );

        let mut statuses = vec![first.status, second.status];
        statuses.sort();
        assert_eq!(statuses, vec![200, 409]);
        let stats = app.get_with_token(routes::MY_STATS, &bob).await;
        assert_eq!(stats.body["quizAttempts"], 1);
        assert_eq!(stats.body["experience"], 25);
    }

    #[tokio::test]
    async fn duplicate_attempt_past_the_existence_check_is_a_conflict() {
        let app = TestApp::spawn().await;
        let (_, bob, pastille_id, quiz) = setup(&app).await;
        let quiz_id = uuid_of(&quiz["id"]);
        let paris = answer_id(&quiz, "Paris");
        let res = app
            .post_with_token(
                &routes::quiz_attempt(pastille_id, quiz_id),
                &json!({"selectedAnswerId": paris}),
                &bob,
            )
            .await;
        assert_eq!(res.status, 200);
        let me = app.get_with_token(routes::ME, &bob).await;

        // Second writer whose existence check ran before the first commit.
        let late = insert_attempt(
            &app.db,
            user_quiz_attempt::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(uuid_of(&me.body["id"])),
                quiz_id: Set(quiz_id),
                selected_answer_id: Set(paris),
                submitted_text: Set(None),
                was_correct: Set(true),
                attempted_at: Set(Utc::now()),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(late, Err(AppError::Conflict(_))));
        let stats = app.get_with_token(routes::MY_STATS, &bob).await;
        assert_eq!(stats.body["quizAttempts"], 1);
    }

    #[tokio::test]
    async fn wrong_answer_is_recorded_without_experience() {
        let app = TestApp::spawn().await;
        let (_, bob, pastille_id, quiz) = setup(&app).await;
        let quiz_id = uuid_of(&quiz["id"]);

        let res = app
            .post_with_token(
                &routes::quiz_attempt(pastille_id, quiz_id),
                &json!({"selectedAnswerId": answer_id(&quiz, "Lyon")}),
                &bob,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["wasCorrect"], false);
        assert_eq!(res.body["experienceGained"], 0);
        assert_eq!(res.body["correctAnswerId"], answer_id(&quiz, "Paris").to_string());

        let stats = app.get_with_token(routes::MY_STATS, &bob).await;
        assert_eq!(stats.body["quizAttempts"], 1);
        assert_eq!(stats.body["correctAttempts"], 0);
    }

    #[tokio::test]
    async fn answer_from_another_quiz_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, bob, pastille_id, quiz) = setup(&app).await;

        let res = app
            .post_with_token(
                &routes::quiz_attempt(pastille_id, uuid_of(&quiz["id"])),
                &json!({"selectedAnswerId": Uuid::new_v4()}),
                &bob,
            )
            .await;

        assert_eq!(res.status, 400);
        let stats = app.get_with_token(routes::MY_STATS, &bob).await;
        assert_eq!(stats.body["quizAttempts"], 0);
    }

    #[tokio::test]
    async fn free_text_ignores_case_and_surrounding_space() {
        let app = TestApp::spawn().await;
        let (alice, bob, pastille_id, _) = setup(&app).await;
        let created = app
            .post_with_token(
                &routes::quizzes(pastille_id),
                &json!({
                    "title": "Engineer",
                    "questionText": "Whose company built the tower?",
                    "quizType": "FreeText",
                    "answers": ["Gustave Eiffel"],
                }),
                &alice,
            )
            .await;
        assert_eq!(created.status, 201, "Create failed: {}", created.text);
        let quiz_id = uuid_of(&created.body["id"]);

        let public = app
            .get_without_token(&routes::quiz(pastille_id, quiz_id))
            .await;
        assert!(public.body["answers"].as_array().unwrap().is_empty());

        let res = app
            .post_with_token(
                &routes::quiz_attempt(pastille_id, quiz_id),
                &json!({"answerText": "  gustave EIFFEL "}),
                &bob,
            )
            .await;

        assert_eq!(res.status, 200, "Attempt failed: {}", res.text);
        assert_eq!(res.body["wasCorrect"], true);
        assert_eq!(res.body["experienceGained"], 25);
    }

    #[tokio::test]
    async fn attempting_requires_authentication() {
        let app = TestApp::spawn().await;
        let (_, _, pastille_id, quiz) = setup(&app).await;

        let res = app
            .post_without_token(
                &routes::quiz_attempt(pastille_id, uuid_of(&quiz["id"])),
                &json!({"selectedAnswerId": answer_id(&quiz, "Paris")}),
            )
            .await;

        assert_eq!(res.status, 401);
    }
}
