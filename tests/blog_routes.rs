use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use chrono::{Duration, NaiveDateTime, Utc};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tempfile::TempDir;
use tower::ServiceExt;

use blogicum::auth::{password, session, users};
use blogicum::blog::catalog::{self, NewCategory};
use blogicum::blog::posts::{self, PostDraft};
use blogicum::blog::comments;
use blogicum::config::Config;
use blogicum::db;
use blogicum::db::models::{Category, Post, User};
use blogicum::routes;
use blogicum::state::AppState;

const BOUNDARY: &str = "----blogicum-test-boundary";

struct TestApp {
    _dir: TempDir,
    state: AppState,
}

struct Account {
    user: User,
    cookie: String,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.database.path = Some(dir.path().join("test.db"));
        config.media.path = Some(dir.path().join("media"));
        config.auth.bcrypt_cost = 4;

        let pool = db::create_pool(config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        TestApp {
            _dir: dir,
            state: AppState { db: pool, config },
        }
    }

    fn conn(&self) -> PooledConnection<SqliteConnectionManager> {
        self.state.db.get().unwrap()
    }

    fn account(&self, username: &str) -> Account {
        let conn = self.conn();
        let user = users::create_user(&conn, username, "unused").unwrap();
        let token = session::create_session(&conn, &user.id, 24).unwrap();
        Account {
            cookie: format!("{}={}", self.state.config.auth.cookie_name, token),
            user,
        }
    }

    fn category(&self, slug: &str, is_published: bool) -> Category {
        catalog::create_category(
            &self.conn(),
            &NewCategory {
                title: &format!("Category {slug}"),
                description: "",
                slug,
                is_published,
            },
        )
        .unwrap()
    }

    fn post(
        &self,
        author: &Account,
        title: &str,
        category: &Category,
        pub_date: NaiveDateTime,
    ) -> Post {
        let draft = PostDraft {
            title: title.to_string(),
            text: format!("{title} text"),
            pub_date,
            is_published: true,
            category_id: Some(category.id.clone()),
            location_id: None,
        };
        posts::insert(&self.conn(), &author.user.id, &draft, None).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response {
        routes::app(self.state.clone()).oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, who: Option<&Account>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(account) = who {
            builder = builder.header(header::COOKIE, &account.cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, who: Option<&Account>, fields: &[(&str, &str)]) -> Response {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(account) = who {
            builder = builder.header(header::COOKIE, &account.cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn post_multipart(
        &self,
        uri: &str,
        who: Option<&Account>,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> Response {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(account) = who {
            builder = builder.header(header::COOKIE, &account.cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    fn post_count(&self) -> i64 {
        self.conn()
            .query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))
            .unwrap()
    }
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[tokio::test]
async fn future_post_is_hidden_from_others_but_listed_for_its_author() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let bob = app.account("bob");
    let open = app.category("open", true);
    let scheduled = app.post(&alice, "Scheduledpost", &open, now() + Duration::days(1));

    let feed = body_text(app.get("/", Some(&bob)).await).await;
    assert!(!feed.contains("Scheduledpost"));

    let own_profile = app.get("/profile/alice/", Some(&alice)).await;
    assert_eq!(own_profile.status(), StatusCode::OK);
    let own_profile = body_text(own_profile).await;
    assert!(own_profile.contains("Scheduledpost"));
    assert!(own_profile.contains("Scheduled"));

    let bobs_view = body_text(app.get("/profile/alice/", Some(&bob)).await).await;
    assert!(!bobs_view.contains("Scheduledpost"));

    let detail_url = format!("/posts/{}/", scheduled.id);
    assert_eq!(app.get(&detail_url, Some(&bob)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&detail_url, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&detail_url, Some(&alice)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_owner_cannot_delete_a_comment() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let bob = app.account("bob");
    let open = app.category("open", true);
    let post = app.post(&alice, "Commented", &open, now() - Duration::hours(1));
    let comment = comments::insert(&app.conn(), &post.id, &alice.user.id, "first!").unwrap();

    let url = format!("/posts/{}/comment/{}/delete/", post.id, comment.id);
    let response = app.post_form(&url, Some(&bob), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));
    assert!(comments::find(&app.conn(), &comment.id).unwrap().is_some());

    // The confirmation page is also withheld.
    let page = app.get(&url, Some(&bob)).await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);

    let response = app.post_form(&url, Some(&alice), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(comments::find(&app.conn(), &comment.id).unwrap().is_none());
}

#[tokio::test]
async fn non_owner_cannot_edit_a_comment() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let bob = app.account("bob");
    let open = app.category("open", true);
    let post = app.post(&alice, "Commented", &open, now() - Duration::hours(1));
    let comment = comments::insert(&app.conn(), &post.id, &alice.user.id, "first!").unwrap();
    let detail = format!("/posts/{}/", post.id);

    let url = format!("/posts/{}/comment/{}/edit/", post.id, comment.id);
    let response = app.post_form(&url, Some(&bob), &[("text", "rewritten")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let page = app.get(&url, Some(&bob)).await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&page), detail);

    let anonymous = app.post_form(&url, None, &[("text", "rewritten")]).await;
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&anonymous), detail);

    let stored = comments::find(&app.conn(), &comment.id).unwrap().unwrap();
    assert_eq!(stored.text, "first!");
}

#[tokio::test]
async fn non_owner_post_edit_and_delete_are_silently_refused() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let bob = app.account("bob");
    let open = app.category("open", true);
    let post = app.post(&alice, "Original", &open, now() - Duration::hours(1));
    let detail = format!("/posts/{}/", post.id);

    let edit_url = format!("/posts/{}/edit/", post.id);
    let response = app
        .post_multipart(
            &edit_url,
            Some(&bob),
            &[
                ("title", "Hijacked"),
                ("text", "mine now"),
                ("pub_date", "2020-01-01T00:00"),
                ("category", open.id.as_str()),
            ],
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let delete_url = format!("/posts/{}/delete/", post.id);
    for who in [Some(&bob), None] {
        let response = app.post_form(&delete_url, who, &[]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), detail);
    }

    let stored = posts::find(&app.conn(), &post.id).unwrap().unwrap();
    assert_eq!(stored.title, "Original");
    assert_eq!(stored.text, post.text);
}

#[tokio::test]
async fn owner_edits_then_deletes_a_post() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let open = app.category("open", true);
    let post = app.post(&alice, "Draftish", &open, now() - Duration::hours(1));
    let comment = comments::insert(&app.conn(), &post.id, &alice.user.id, "note").unwrap();

    let edit_url = format!("/posts/{}/edit/", post.id);
    let form = app.get(&edit_url, Some(&alice)).await;
    assert_eq!(form.status(), StatusCode::OK);
    assert!(body_text(form).await.contains("Draftish"));

    let response = app
        .post_multipart(
            &edit_url,
            Some(&alice),
            &[
                ("title", "Polished"),
                ("text", "better text"),
                ("pub_date", "2024-05-06T07:08"),
                ("category", open.id.as_str()),
            ],
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));

    let stored = posts::find(&app.conn(), &post.id).unwrap().unwrap();
    assert_eq!(stored.title, "Polished");
    // No checkbox in the submission means unpublished.
    assert!(!stored.is_published);

    let response = app
        .post_form(&format!("/posts/{}/delete/", post.id), Some(&alice), &[])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/alice/");
    assert!(posts::find(&app.conn(), &post.id).unwrap().is_none());
    assert!(comments::find(&app.conn(), &comment.id).unwrap().is_none());
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let open = app.category("open", true);
    let post = app.post(&alice, "Public", &open, now() - Duration::hours(1));

    let response = app.get("/posts/create/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/?next=%2Fposts%2Fcreate%2F");

    let url = format!("/posts/{}/comment/", post.id);
    let response = app.post_form(&url, None, &[("text", "hello")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/?next="));
    assert!(comments::for_post(&app.conn(), &post.id).unwrap().is_empty());

    let response = app.get("/profile/edit/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn create_post_with_image_and_reject_duplicate() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let open = app.category("open", true);
    let fields = [
        ("title", "Holiday"),
        ("text", "Sea and sun"),
        ("pub_date", "2020-01-01T10:00"),
        ("category", open.id.as_str()),
        ("location", ""),
        ("is_published", "on"),
    ];
    let png: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    let response = app
        .post_multipart("/posts/create/", Some(&alice), &fields, Some(("beach.png", png)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/alice/");
    assert_eq!(app.post_count(), 1);

    let image: String = app
        .conn()
        .query_row("SELECT image FROM posts", [], |r| r.get(0))
        .unwrap();
    let served = app.get(&format!("/media/{}", image), None).await;
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(served).await, png);

    let again = app
        .post_multipart("/posts/create/", Some(&alice), &fields, None)
        .await;
    assert_eq!(again.status(), StatusCode::OK);
    assert!(body_text(again).await.contains("You already have a post with this title and text."));
    assert_eq!(app.post_count(), 1);

    let feed = body_text(app.get("/", None).await).await;
    assert!(feed.contains("Holiday"));
}

#[tokio::test]
async fn upload_with_clear_is_rejected_without_saving_the_file() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let open = app.category("open", true);
    let post = app.post(&alice, "Framed", &open, now() - Duration::hours(1));

    let response = app
        .post_multipart(
            &format!("/posts/{}/edit/", post.id),
            Some(&alice),
            &[
                ("title", "Framed"),
                ("text", "new text"),
                ("pub_date", "2020-01-01T10:00"),
                ("category", open.id.as_str()),
                ("is_published", "on"),
                ("image-clear", "on"),
            ],
            Some(("frame.png", &b"\x89PNG\r\n\x1a\nfake"[..])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Please either submit a file or check the clear checkbox, not both."));

    let images = app.state.config.media_path().join("posts_images");
    let saved = std::fs::read_dir(&images).map(|dir| dir.count()).unwrap_or(0);
    assert_eq!(saved, 0);
    let stored = posts::find(&app.conn(), &post.id).unwrap().unwrap();
    assert_eq!(stored.text, post.text);
    assert!(stored.image.is_none());
}

#[tokio::test]
async fn invalid_post_form_is_rerendered() {
    let app = TestApp::new();
    let alice = app.account("alice");

    let response = app
        .post_multipart(
            "/posts/create/",
            Some(&alice),
            &[("title", ""), ("text", "body"), ("pub_date", "whenever")],
            Some(("notes.txt", &b"plain text"[..])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("This field is required."));
    assert!(body.contains("Enter a valid date/time."));
    assert!(body.contains("Upload a valid image."));
    assert_eq!(app.post_count(), 0);
}

#[tokio::test]
async fn page_beyond_the_end_shows_the_last_page() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let open = app.category("open", true);
    for i in 0..12 {
        app.post(&alice, &format!("Entry{i:02}"), &open, now() - Duration::hours(i + 1));
    }

    let response = app.get("/?page=99", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Page 2 of 2"));
    assert!(body.contains("Entry11"));
    assert!(!body.contains("Entry00"));

    let first = body_text(app.get("/?page=abc", None).await).await;
    assert!(first.contains("Page 1 of 2"));
    assert!(first.contains("Entry00"));
}

#[tokio::test]
async fn category_pages_require_a_published_category() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let open = app.category("travel", true);
    let closed = app.category("secret", false);
    app.post(&alice, "Trip", &open, now() - Duration::hours(1));
    app.post(&alice, "Hidden", &closed, now() - Duration::hours(1));

    let response = app.get("/category/travel/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Category travel"));
    assert!(body.contains("Trip"));

    assert_eq!(app.get("/category/secret/", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/category/nope/", None).await.status(), StatusCode::NOT_FOUND);

    let feed = body_text(app.get("/", None).await).await;
    assert!(!feed.contains("Hidden"));
}

#[tokio::test]
async fn unpublishing_a_category_takes_its_page_and_posts_offline() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let travel = app.category("travel", true);
    let post = app.post(&alice, "Trip", &travel, now() - Duration::hours(1));
    assert_eq!(app.get("/category/travel/", None).await.status(), StatusCode::OK);

    assert!(catalog::set_category_published(&app.conn(), "travel", false).unwrap());
    assert_eq!(app.get("/category/travel/", None).await.status(), StatusCode::NOT_FOUND);
    assert!(!body_text(app.get("/", None).await).await.contains("Trip"));
    let detail = format!("/posts/{}/", post.id);
    assert_eq!(app.get(&detail, None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&detail, Some(&alice)).await.status(), StatusCode::OK);

    assert!(catalog::set_category_published(&app.conn(), "travel", true).unwrap());
    assert_eq!(app.get("/category/travel/", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn commenting_on_a_public_post() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let bob = app.account("bob");
    let open = app.category("open", true);
    let post = app.post(&alice, "Talkative", &open, now() - Duration::hours(1));
    let url = format!("/posts/{}/comment/", post.id);

    let response = app.post_form(&url, Some(&bob), &[("text", "Nice one")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));

    let blank = app.post_form(&url, Some(&bob), &[("text", "   ")]).await;
    assert_eq!(blank.status(), StatusCode::OK);
    assert!(body_text(blank).await.contains("This field is required."));

    let listed = comments::for_post(&app.conn(), &post.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].author_username, "bob");

    let detail = body_text(app.get(&format!("/posts/{}/", post.id), None).await).await;
    assert!(detail.contains("Nice one"));
    assert!(detail.contains("Comments (1)"));
}

#[tokio::test]
async fn comments_stay_inside_their_post() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let open = app.category("open", true);
    let first = app.post(&alice, "First", &open, now() - Duration::hours(2));
    let second = app.post(&alice, "Second", &open, now() - Duration::hours(1));
    let comment = comments::insert(&app.conn(), &first.id, &alice.user.id, "on first").unwrap();

    let wrong = format!("/posts/{}/comment/{}/edit/", second.id, comment.id);
    assert_eq!(app.get(&wrong, Some(&alice)).await.status(), StatusCode::NOT_FOUND);

    let right = format!("/posts/{}/comment/{}/edit/", first.id, comment.id);
    let response = app.post_form(&right, Some(&alice), &[("text", "edited")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(comments::find(&app.conn(), &comment.id).unwrap().unwrap().text, "edited");
}

#[tokio::test]
async fn cannot_comment_on_a_hidden_post() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let bob = app.account("bob");
    let open = app.category("open", true);
    let post = app.post(&alice, "Later", &open, now() + Duration::days(3));

    let url = format!("/posts/{}/comment/", post.id);
    let response = app.post_form(&url, Some(&bob), &[("text", "early bird")]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(comments::for_post(&app.conn(), &post.id).unwrap().is_empty());
}

#[tokio::test]
async fn register_login_and_logout() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/auth/registration/",
            None,
            &[
                ("username", "carol"),
                ("password1", "correct horse"),
                ("password2", "correct horse"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/");

    let wrong = app
        .post_form(
            "/auth/login/",
            None,
            &[("username", "carol"), ("password", "battery staple")],
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::OK);
    assert!(body_text(wrong).await.contains("Please enter a correct username and password."));

    let response = app
        .post_form(
            "/auth/login/",
            None,
            &[
                ("username", "carol"),
                ("password", "correct horse"),
                ("next", "/posts/create/"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/posts/create/");
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("blogicum_session="));

    let carol = users::find_by_username(&app.conn(), "carol").unwrap().unwrap();
    let account = Account { user: carol, cookie };
    assert_eq!(app.get("/posts/create/", Some(&account)).await.status(), StatusCode::OK);

    let response = app.post_form("/auth/logout/", Some(&account), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let sessions: i64 = app
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM sessions WHERE user_id = ?1",
            params![account.user.id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(sessions, 0);
    assert_eq!(app.get("/posts/create/", Some(&account)).await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_ignores_offsite_next() {
    let app = TestApp::new();
    let hash = password::hash_password("correct horse", 4).unwrap();
    users::create_user(&app.conn(), "dave", &hash).unwrap();

    let response = app
        .post_form(
            "/auth/login/",
            None,
            &[
                ("username", "dave"),
                ("password", "correct horse"),
                ("next", "https://evil.example/"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn profile_edit_renames_the_user() {
    let app = TestApp::new();
    let alice = app.account("alice");
    app.account("bob");

    let taken = app
        .post_form(
            "/profile/edit/",
            Some(&alice),
            &[("username", "bob"), ("first_name", ""), ("last_name", ""), ("email", "")],
        )
        .await;
    assert_eq!(taken.status(), StatusCode::OK);
    assert!(body_text(taken).await.contains("A user with that username already exists."));

    let response = app
        .post_form(
            "/profile/edit/",
            Some(&alice),
            &[
                ("username", "alicia"),
                ("first_name", "Alice"),
                ("last_name", "Liddell"),
                ("email", "alice@example.com"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/alicia/");

    let profile = body_text(app.get("/profile/alicia/", None).await).await;
    assert!(profile.contains("Alice Liddell"));
    assert_eq!(app.get("/profile/alice/", None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_paths_render_the_not_found_page() {
    let app = TestApp::new();

    let response = app.get("/no/such/page", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("does not exist"));

    assert_eq!(app.get("/posts/missing/", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/media/../test.db", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/assets/css/blog.css", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_category_keeps_its_posts() {
    let app = TestApp::new();
    let alice = app.account("alice");
    let travel = app.category("travel", true);
    let post = app.post(&alice, "Orphan", &travel, now() - Duration::hours(1));

    assert!(catalog::delete_category(&app.conn(), "travel").unwrap());

    let stored = posts::find(&app.conn(), &post.id).unwrap().unwrap();
    assert_eq!(stored.category_id, None);
    let feed = body_text(app.get("/", None).await).await;
    assert!(!feed.contains("Orphan"));
    let own = body_text(app.get("/profile/alice/", Some(&alice)).await).await;
    assert!(own.contains("Orphan"));
}
