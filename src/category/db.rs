//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryUpdate, NewCategory},
    database_id::DatabaseId,
    transaction::TransactionType,
};

/// Initialize the category table and indexes.
///
/// Default names are unique among the defaults and custom names are unique
/// per user.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            user_id INTEGER REFERENCES user(id) ON DELETE CASCADE
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_category_default_name
            ON category(name) WHERE is_default = 1;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_category_user_name
            ON category(user_id, name) WHERE user_id IS NOT NULL;",
    )?;

    Ok(())
}

const CATEGORY_COLUMNS: &str = "id, name, type, icon, color, is_default, user_id";

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
        is_default: row.get(5)?,
        user_id: row.get::<_, Option<i64>>(6)?.map(UserID::new),
    })
}

/// Retrieve the default categories and, if given, the user's own categories.
///
/// Defaults come first, then categories are sorted by name.
pub fn list_categories(
    user_id: Option<UserID>,
    kind: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE (is_default = 1 OR (?1 IS NOT NULL AND user_id = ?1))
               AND (?2 IS NULL OR type = ?2)
             ORDER BY is_default DESC, name ASC"
        ))?
        .query_map((user_id.map(|id| id.as_i64()), kind), map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::SqlError))
        .collect()
}

/// Whether `name` is used by a default category or one of the user's
/// categories other than `except_id`.
fn name_taken(
    name: &str,
    user_id: UserID,
    except_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<bool, Error> {
    let taken = connection.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM category
            WHERE name = ?1
              AND (is_default = 1 OR user_id = ?2)
              AND (?3 IS NULL OR id != ?3)
        )",
        (name, user_id.as_i64(), except_id),
        |row| row.get(0),
    )?;

    Ok(taken)
}

fn name_conflict() -> Error {
    Error::Conflict("a category with this name already exists".to_owned())
}

/// Whether `category_id` is one of the user's own categories, defaults excluded.
fn owns_category(
    category_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    let owned = connection.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2 AND is_default = 0
        )",
        (category_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    Ok(owned)
}

/// Create a category owned by the user.
///
/// # Errors
///
/// Returns an [Error::Conflict] if a default category or another category
/// of the user already has the name.
pub fn create_category(
    user_id: UserID,
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    if name_taken(&new_category.name, user_id, None, connection)? {
        return Err(name_conflict());
    }

    let category = connection
        .prepare(&format!(
            "INSERT INTO category (name, type, icon, color, is_default, user_id)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                new_category.name,
                new_category.kind,
                new_category.icon,
                new_category.color,
                user_id.as_i64(),
            ),
            map_row,
        )?;

    Ok(category)
}

/// Apply `update` to one of the user's own categories.
///
/// # Errors
///
/// Returns an [Error::NotFound] if `category_id` is a default category or
/// belongs to someone else, and an [Error::Conflict] if the new name is taken.
pub fn update_category(
    category_id: DatabaseId,
    user_id: UserID,
    update: CategoryUpdate,
    connection: &Connection,
) -> Result<Category, Error> {
    if !owns_category(category_id, user_id, connection)? {
        return Err(Error::NotFound);
    }

    if let Some(name) = &update.name {
        if name_taken(name, user_id, Some(category_id), connection)? {
            return Err(name_conflict());
        }
    }

    let category = connection
        .prepare(&format!(
            "UPDATE category
             SET name = COALESCE(?3, name),
                 type = COALESCE(?4, type),
                 icon = COALESCE(?5, icon),
                 color = COALESCE(?6, color)
             WHERE id = ?1 AND user_id = ?2 AND is_default = 0
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                category_id,
                user_id.as_i64(),
                update.name,
                update.kind,
                update.icon,
                update.color,
            ),
            map_row,
        )?;

    Ok(category)
}

/// Delete one of the user's own categories.
///
/// Transactions keep the category name they were recorded with.
///
/// # Errors
///
/// Returns an [Error::NotFound] if `category_id` is a default category or
/// belongs to someone else.
pub fn delete_category(
    category_id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2 AND is_default = 0",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::UserID,
        category::{CategoryUpdate, NewCategory, defaults::DEFAULT_CATEGORIES},
        transaction::{
            TransactionType,
            test_utils::{get_test_connection, insert_test_user},
        },
    };

    use super::{create_category, delete_category, list_categories, update_category};

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_owned(),
            kind: TransactionType::Expense,
            icon: "🐶".to_owned(),
            color: "#123456".to_owned(),
        }
    }

    fn default_category_id(connection: &Connection) -> i64 {
        connection
            .query_row("SELECT id FROM category WHERE is_default = 1 LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[test]
    fn anonymous_list_has_only_defaults() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        create_category(user_id, new_category("pets"), &conn).unwrap();

        let got = list_categories(None, None, &conn).unwrap();

        assert_eq!(got.len(), DEFAULT_CATEGORIES.len());
        assert!(got.iter().all(|category| category.is_default));
    }

    #[test]
    fn user_list_has_defaults_first_then_own() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let other_user = insert_test_user("b@example.com", &conn);
        let pets = create_category(user_id, new_category("pets"), &conn).unwrap();
        create_category(other_user, new_category("garden"), &conn).unwrap();

        let got = list_categories(Some(user_id), None, &conn).unwrap();

        assert_eq!(got.len(), DEFAULT_CATEGORIES.len() + 1);
        assert_eq!(got.last(), Some(&pets));
        assert_eq!(pets.user_id, Some(user_id));
        assert!(!pets.is_default);
    }

    #[test]
    fn list_filters_by_type() {
        let conn = get_test_connection();

        let got = list_categories(None, Some(TransactionType::Income), &conn).unwrap();

        let names: Vec<&str> = got.iter().map(|category| category.name.as_str()).collect();
        assert_eq!(names, vec!["freelance", "investments", "other income", "salary"]);
    }

    #[test]
    fn cannot_shadow_default_name() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);

        let got = create_category(user_id, new_category("travel"), &conn);

        assert!(matches!(got, Err(Error::Conflict(_))));
    }

    #[test]
    fn names_are_unique_per_user() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let other_user = insert_test_user("b@example.com", &conn);
        create_category(user_id, new_category("pets"), &conn).unwrap();

        let duplicate = create_category(user_id, new_category("pets"), &conn);
        let other_users = create_category(other_user, new_category("pets"), &conn);

        assert!(matches!(duplicate, Err(Error::Conflict(_))));
        assert!(other_users.is_ok());
    }

    #[test]
    fn update_changes_given_fields() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let pets = create_category(user_id, new_category("pets"), &conn).unwrap();

        let got = update_category(
            pets.id,
            user_id,
            CategoryUpdate {
                color: Some("#ABCDEF".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.name, "pets");
        assert_eq!(got.color, "#ABCDEF");
    }

    #[test]
    fn update_can_keep_own_name() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let pets = create_category(user_id, new_category("pets"), &conn).unwrap();

        let got = update_category(
            pets.id,
            user_id,
            CategoryUpdate {
                name: Some("pets".to_owned()),
                ..Default::default()
            },
            &conn,
        );

        assert!(got.is_ok());
    }

    #[test]
    fn defaults_cannot_be_changed_or_deleted() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let default_id = default_category_id(&conn);

        let updated = update_category(default_id, user_id, CategoryUpdate::default(), &conn);
        let deleted = delete_category(default_id, user_id, &conn);

        assert_eq!(updated, Err(Error::NotFound));
        assert_eq!(deleted, Err(Error::NotFound));
    }

    #[test]
    fn renaming_default_to_taken_name_is_not_found() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let default_id = default_category_id(&conn);
        let taken = list_categories(None, None, &conn)
            .unwrap()
            .into_iter()
            .find(|category| category.id != default_id)
            .unwrap()
            .name;

        let got = update_category(
            default_id,
            user_id,
            CategoryUpdate {
                name: Some(taken),
                ..Default::default()
            },
            &conn,
        );

        assert_eq!(got, Err(Error::NotFound));
    }

    #[test]
    fn cannot_delete_other_users_category() {
        let conn = get_test_connection();
        let user_id = insert_test_user("a@example.com", &conn);
        let pets = create_category(user_id, new_category("pets"), &conn).unwrap();

        let got = delete_category(pets.id, UserID::new(user_id.as_i64() + 1), &conn);

        assert_eq!(got, Err(Error::NotFound));
        assert!(delete_category(pets.id, user_id, &conn).is_ok());
    }
}
