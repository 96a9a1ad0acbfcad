use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app.register("alice@example.com", "Alice").await;

        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_string());
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["displayName"], "Alice");
    }

    #[tokio::test]
    async fn email_is_unique_regardless_of_case() {
        let app = TestApp::spawn().await;

        let first = app.register("alice@example.com", "Alice").await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.register("ALICE@Example.com", "Alice Again").await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_short_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "a@x.com", "password": "short", "displayName": "Alice"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "password");
    }

    #[tokio::test]
    async fn cannot_register_with_a_short_display_name() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "a@x.com", "password": PASSWORD, "displayName": "Al"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "displayName");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_tokens_and_profile() {
        let app = TestApp::spawn().await;
        app.register("a@x.com", "Alice").await;

        let res = app.login("a@x.com", PASSWORD).await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert!(res.body["refreshToken"].as_str().is_some_and(|t| !t.is_empty()));
        assert!(res.body["expiration"].is_string());
        assert_eq!(res.body["user"]["displayName"], "Alice");
        assert_eq!(res.body["user"]["experience"], 0);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("a@x.com", "Alice").await;

        let res = app.login("a@x.com", "Wrong-password1").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_looks_like_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app.login("nobody@x.com", PASSWORD).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn access_token_opens_the_profile() {
        let app = TestApp::spawn().await;
        let (token, user_id) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], user_id.to_string());
        assert_eq!(res.body["email"], "a@x.com");
    }

    #[tokio::test]
    async fn profile_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn refresh_token_rotates_and_cannot_be_reused() {
        let app = TestApp::spawn().await;
        app.register("a@x.com", "Alice").await;
        let login = app.login("a@x.com", PASSWORD).await;
        let first = login.body["refreshToken"].as_str().unwrap().to_string();

        let rotated = app
            .post_without_token(routes::REFRESH, &json!({"refreshToken": first}))
            .await;
        assert_eq!(rotated.status, 200, "Refresh failed: {}", rotated.text);
        let second = rotated.body["refreshToken"].as_str().unwrap();
        assert_ne!(second, first);

        let new_token = rotated.body["token"].as_str().unwrap();
        assert_eq!(app.get_with_token(routes::ME, new_token).await.status, 200);

        let reused = app
            .post_without_token(routes::REFRESH, &json!({"refreshToken": first}))
            .await;
        assert_eq!(reused.status, 401);
        assert_eq!(reused.body["code"], "SESSION_EXPIRED");
    }

    #[tokio::test]
    async fn unknown_refresh_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::REFRESH, &json!({"refreshToken": "bogus"}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "SESSION_EXPIRED");
    }

    #[tokio::test]
    async fn new_login_invalidates_the_previous_refresh_token() {
        let app = TestApp::spawn().await;
        app.register("a@x.com", "Alice").await;
        let first = app.login("a@x.com", PASSWORD).await;
        let old = first.body["refreshToken"].as_str().unwrap().to_string();

        app.login("a@x.com", PASSWORD).await;

        let res = app
            .post_without_token(routes::REFRESH, &json!({"refreshToken": old}))
            .await;
        assert_eq!(res.status, 401);
    }
}

mod password_reset {
    use super::*;

    /// Email and token carried by the reset link in a mail body.
    fn reset_link_params(body: &str) -> (String, String) {
        let link = body
            .split_whitespace()
            .find(|word| word.starts_with("http://localhost/reset-password?"))
            .expect("Reset link missing");
        let link = reqwest::Url::parse(link).unwrap();
        let param = |name: &str| {
            link.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .unwrap_or_else(|| panic!("Reset link has no {name}"))
        };
        (param("email"), param("token"))
    }

    #[tokio::test]
    async fn reset_link_sets_a_new_password_once() {
        let app = TestApp::spawn().await;
        app.register("a@x.com", "Alice").await;

        let res = app
            .post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "a@x.com"}))
            .await;
        assert_eq!(res.status, 200, "Forgot password failed: {}", res.text);

        let mails = app.mailer.sent();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].to, "a@x.com");
        let (email, token) = reset_link_params(&mails[0].body);
        assert_eq!(email, "a@x.com");

        let reset = json!({
            "email": "a@x.com",
            "token": token,
            "newPassword": "BrandNew123!",
            "confirmPassword": "BrandNew123!",
        });
        let res = app.post_without_token(routes::RESET_PASSWORD, &reset).await;
        assert_eq!(res.status, 200, "Reset failed: {}", res.text);

        assert_eq!(app.login("a@x.com", PASSWORD).await.status, 401);
        assert_eq!(app.login("a@x.com", "BrandNew123!").await.status, 200);

        let again = app.post_without_token(routes::RESET_PASSWORD, &reset).await;
        assert_eq!(again.status, 400);
        assert_eq!(again.body["code"], "RESET_FAILED");
    }

    #[tokio::test]
    async fn reset_link_escapes_the_email() {
        let app = TestApp::spawn().await;
        app.register("a+walks@x.com", "Alice").await;

        app.post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "a+walks@x.com"}))
            .await;

        let body = &app.mailer.sent()[0].body;
        assert!(body.contains("email=a%2Bwalks%40x.com&token="), "{body}");
        let (email, token) = reset_link_params(body);
        assert_eq!(email, "a+walks@x.com");

        let res = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({
                    "email": email,
                    "token": token,
                    "newPassword": "BrandNew123!",
                    "confirmPassword": "BrandNew123!",
                }),
            )
            .await;
        assert_eq!(res.status, 200, "Reset failed: {}", res.text);
    }

    #[tokio::test]
    async fn unknown_email_gets_the_same_answer_and_no_mail() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "ghost@x.com"}))
            .await;

        assert_eq!(res.status, 200);
        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({
                    "email": "a@x.com",
                    "token": "abc",
                    "newPassword": "BrandNew123!",
                    "confirmPassword": "Different123!",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "confirmPassword");
    }

    #[tokio::test]
    async fn wrong_token_fails_the_reset() {
        let app = TestApp::spawn().await;
        app.register("a@x.com", "Alice").await;
        app.post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "a@x.com"}))
            .await;

        let res = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({
                    "email": "a@x.com",
                    "token": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                    "newPassword": "BrandNew123!",
                    "confirmPassword": "BrandNew123!",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "RESET_FAILED");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn display_name_and_bio_can_be_updated() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app
            .put_with_token(
                routes::ME,
                &json!({"displayName": "Alice B", "bio": "Walks a lot"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "Update failed: {}", res.text);
        assert_eq!(res.body["displayName"], "Alice B");
        assert_eq!(res.body["bio"], "Walks a lot");
    }

    #[tokio::test]
    async fn profile_picture_upload_stores_the_avatar() {
        let app = TestApp::spawn().await;
        let (token, user_id) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app
            .upload_with_token(
                "/api/users/me/profile-picture",
                "me.png",
                "image/png",
                b"png bytes".to_vec(),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "Upload failed: {}", res.text);
        assert!(res.body["profilePictureUrl"].as_str().is_some_and(|u| !u.is_empty()));
        assert!(app.store.keys().iter().any(|k| k.contains(&user_id.to_string())));
    }

    #[tokio::test]
    async fn profile_picture_must_be_an_image() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app
            .upload_with_token(
                "/api/users/me/profile-picture",
                "notes.txt",
                "text/plain",
                b"hello".to_vec(),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn new_user_starts_with_empty_stats() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_authenticated_user("a@x.com", "Alice").await;

        let res = app.get_with_token(routes::MY_STATS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["experience"], 0);
        assert_eq!(res.body["pastillesCount"], 0);
        assert_eq!(res.body["progress"], 0.0);
    }
}
