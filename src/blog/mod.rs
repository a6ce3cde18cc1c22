pub mod catalog;
pub mod comments;
pub mod forms;
pub mod pagination;
pub mod posts;
pub mod visibility;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDateTime;
    use rusqlite::Connection;

    use crate::auth::users;
    use crate::blog::catalog::{self, NewCategory};
    use crate::blog::posts::{self, PostDraft};
    use crate::db::models::{Category, Post, User};

    pub fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    pub fn user(conn: &Connection, username: &str) -> User {
        users::create_user(conn, username, "not-a-real-hash").unwrap()
    }

    pub fn category(conn: &Connection, slug: &str, is_published: bool) -> Category {
        catalog::create_category(
            conn,
            &NewCategory {
                title: &format!("{slug} title"),
                description: "",
                slug,
                is_published,
            },
        )
        .unwrap()
    }

    pub fn post(
        conn: &Connection,
        author_id: &str,
        title: &str,
        category: Option<&Category>,
        pub_date: NaiveDateTime,
        is_published: bool,
    ) -> Post {
        let draft = PostDraft {
            title: title.to_string(),
            text: format!("{title} body"),
            pub_date,
            is_published,
            category_id: category.map(|c| c.id.clone()),
            location_id: None,
        };
        posts::insert(conn, author_id, &draft, None).unwrap()
    }

    pub fn draft_of(post: &Post) -> PostDraft {
        PostDraft {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            is_published: post.is_published,
            category_id: post.category_id.clone(),
            location_id: post.location_id.clone(),
        }
    }
}
