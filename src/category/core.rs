use rand::Rng;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::DatabaseId, user::UserId};

/// Who can see and use a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryAccess {
    /// Visible only to the user who created it.
    #[default]
    Private,
    /// Visible to every user.
    Public,
}

impl CategoryAccess {
    /// The string stored in the database for this access level.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryAccess::Private => "private",
            CategoryAccess::Public => "public",
        }
    }

    /// Parse an access level from its database representation.
    ///
    /// Unknown strings map to [CategoryAccess::Private], the safe default.
    pub fn from_str_or_default(value: &str) -> Self {
        match value {
            "public" => CategoryAccess::Public,
            _ => CategoryAccess::Private,
        }
    }
}

/// A label for grouping transactions, e.g. "groceries" or "rent".
///
/// Categories form a shallow tree through `ancestor_id` and are addressed by
/// `slug` in the API rather than by row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The id for the category.
    pub id: DatabaseId,
    /// The user who created the category.
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// The category name, stored lowercase. Unique.
    pub name: String,
    /// The URL-safe identifier: the slugified name plus a random suffix.
    pub slug: String,
    /// The parent category, if this is a subcategory.
    #[serde(rename = "ancestor")]
    pub ancestor_id: Option<DatabaseId>,
    /// Who can see the category.
    pub access: CategoryAccess,
    /// When the category was created.
    #[serde(rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to create a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// The user creating the category.
    pub user_id: UserId,
    /// The category name. Lowercased before storage.
    pub name: String,
    /// The parent category, if this is a subcategory.
    pub ancestor_id: Option<DatabaseId>,
    /// Who can see the category.
    pub access: CategoryAccess,
}

/// Create the category table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL UNIQUE,
            ancestor_id INTEGER,
            access TEXT NOT NULL DEFAULT 'private',
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id),
            FOREIGN KEY(ancestor_id) REFERENCES category(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_category(row: &rusqlite::Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let name = row.get(2)?;
    let slug = row.get(3)?;
    let ancestor_id = row.get(4)?;
    let raw_access: String = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Category {
        id,
        user_id,
        name,
        slug,
        ancestor_id,
        access: CategoryAccess::from_str_or_default(&raw_access),
        created_at,
    })
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, slug, ancestor_id, access, created_at";

/// Reduce a category name to lowercase ASCII letters, digits, and dashes.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = true;

    for character in name.chars() {
        if character.is_ascii_alphanumeric() {
            slug.push(character.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Create and insert a new category into the database.
///
/// The name is lowercased and the slug is derived from it with a random hex
/// suffix so renames and near-duplicates cannot collide in URLs.
///
/// # Errors
///
/// Returns [Error::DuplicateCategoryName] if a category with the same name
/// already exists, or [Error::SqlError] if another SQL related error occurred.
pub fn create_category(
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = new_category.name.to_lowercase();
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    let slug = format!("{}-{suffix:06x}", slugify(&name));
    let created_at = OffsetDateTime::now_utc();

    let id = connection
        .query_one(
            "INSERT INTO category (user_id, name, slug, ancestor_id, access, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
            (
                new_category.user_id.as_i64(),
                &name,
                &slug,
                new_category.ancestor_id,
                new_category.access.as_str(),
                created_at,
            ),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCategoryName(name.clone()),
            error => error.into(),
        })?;

    Ok(Category {
        id,
        user_id: new_category.user_id,
        name,
        slug,
        ancestor_id: new_category.ancestor_id,
        access: new_category.access,
        created_at,
    })
}

/// Get the category with `slug`.
///
/// # Errors
///
/// Returns [Error::MissingResource] if no category has `slug`, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn get_category_by_slug(slug: &str, connection: &Connection) -> Result<Category, Error> {
    connection
        .query_one(
            &format!("SELECT {CATEGORY_COLUMNS} FROM category WHERE slug = :slug"),
            &[(":slug", &slug)],
            map_row_to_category,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingResource("category"),
            error => error.into(),
        })
}

/// Get the categories visible to `user_id`: public ones plus the user's own,
/// in name order.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn list_categories(
    user_id: UserId,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE access = 'public' OR user_id = ?1
             ORDER BY name
             LIMIT ?2 OFFSET ?3"
        ))?
        .query_map((user_id.as_i64(), limit, offset), map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of categories visible to `user_id`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn count_categories(user_id: UserId, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_one(
            "SELECT COUNT(id) FROM category WHERE access = 'public' OR user_id = ?1",
            (user_id.as_i64(),),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the direct subcategories of the category with `ancestor_id`.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn get_subcategories(
    ancestor_id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE ancestor_id = :ancestor_id
             ORDER BY name"
        ))?
        .query_map(&[(":ancestor_id", &ancestor_id)], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}


#[cfg(test)]
mod category_tests {
    use rusqlite::Connection;

    use crate::{Error, user::UserId};

    use super::{
        CategoryAccess, NewCategory, count_categories, create_category, create_category_table,
        get_category_by_slug, get_subcategories, list_categories,
    };

    fn get_test_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_category_table(&conn).expect("Could not create category table");

        conn
    }

    fn test_category(user_id: UserId, name: &str, access: CategoryAccess) -> NewCategory {
        NewCategory {
            user_id,
            name: name.to_owned(),
            ancestor_id: None,
            access,
        }
    }

    #[test]
    fn create_lowercases_name_and_derives_slug() {
        let conn = get_test_connection();

        let category = create_category(
            test_category(UserId::new(1), "Groceries", CategoryAccess::Private),
            &conn,
        )
        .unwrap();

        assert_eq!(category.name, "groceries");
        assert!(category.slug.starts_with("groceries-"));
        // Slug carries a 6 character hex suffix after the dash.
        assert_eq!(category.slug.len(), "groceries-".len() + 6);
    }

    #[test]
    fn create_fails_on_duplicate_name() {
        let conn = get_test_connection();
        create_category(
            test_category(UserId::new(1), "Groceries", CategoryAccess::Private),
            &conn,
        )
        .unwrap();

        let result = create_category(
            test_category(UserId::new(2), "GROCERIES", CategoryAccess::Private),
            &conn,
        );

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("groceries".to_owned()))
        );
    }

    #[test]
    fn get_by_slug_round_trips() {
        let conn = get_test_connection();
        let category = create_category(
            test_category(UserId::new(1), "Rent", CategoryAccess::Public),
            &conn,
        )
        .unwrap();

        let retrieved_category = get_category_by_slug(&category.slug, &conn).unwrap();

        assert_eq!(retrieved_category, category);
    }

    #[test]
    fn get_by_slug_fails_for_unknown_slug() {
        let conn = get_test_connection();

        let result = get_category_by_slug("rent-abc123", &conn);

        assert_eq!(result, Err(Error::MissingResource("category")));
    }

    #[test]
    fn list_shows_public_and_own_private_categories() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        create_category(test_category(user_id, "Rent", CategoryAccess::Private), &conn).unwrap();
        create_category(
            test_category(UserId::new(2), "Groceries", CategoryAccess::Public),
            &conn,
        )
        .unwrap();
        create_category(
            test_category(UserId::new(2), "Secret", CategoryAccess::Private),
            &conn,
        )
        .unwrap();

        let categories = list_categories(user_id, 10, 0, &conn).unwrap();

        let names: Vec<&str> = categories
            .iter()
            .map(|category| category.name.as_str())
            .collect();
        assert_eq!(names, vec!["groceries", "rent"]);
        assert_eq!(count_categories(user_id, &conn).unwrap(), 2);
    }

    #[test]
    fn list_honors_limit_and_offset() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        for name in ["A", "B", "C"] {
            create_category(test_category(user_id, name, CategoryAccess::Private), &conn).unwrap();
        }

        let first_page = list_categories(user_id, 2, 0, &conn).unwrap();
        let second_page = list_categories(user_id, 2, 2, &conn).unwrap();

        assert_eq!(first_page.len(), 2);
        assert_eq!(second_page.len(), 1);
    }

    #[test]
    fn subcategories_list_direct_children_only() {
        let conn = get_test_connection();
        let user_id = UserId::new(1);
        let parent =
            create_category(test_category(user_id, "Home", CategoryAccess::Public), &conn)
                .unwrap();
        let mut child = test_category(user_id, "Power", CategoryAccess::Public);
        child.ancestor_id = Some(parent.id);
        create_category(child, &conn).unwrap();
        let mut other_child = test_category(user_id, "Water", CategoryAccess::Public);
        other_child.ancestor_id = Some(parent.id);
        create_category(other_child, &conn).unwrap();
        create_category(test_category(user_id, "Travel", CategoryAccess::Public), &conn).unwrap();

        let subcategories = get_subcategories(parent.id, &conn).unwrap();

        let names: Vec<&str> = subcategories
            .iter()
            .map(|category| category.name.as_str())
            .collect();
        assert_eq!(names, vec!["power", "water"]);
    }
}
