//! SQLite-backed persistence gateway
//!
//! Schema is created on startup with `CREATE TABLE IF NOT EXISTS`; queries
//! are runtime-checked so the binary never needs a database at compile time.
//!
//! Passwords are stored as SHA-256 hex digests. Room pins are compared in
//! process rather than in the query, so a lookup miss and a pin mismatch are
//! indistinguishable to the caller.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use plaza_domain::{
    DomainError, FurnitureItem, Presence, RoomId, RoomSummary, RoomTemplate, TemplateId, UserId,
    UserProfile,
};

use super::{PersistenceGateway, RoomSpec};

/// Gateway backed by a SQLite connection pool
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    /// Connect and bring the schema up to date.
    ///
    /// A single connection keeps `sqlite::memory:` databases coherent and is
    /// plenty for the write rates this engine sees.
    pub async fn connect(database_url: &str) -> Result<Self, DomainError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(db_err)?;
        let gateway = Self { pool };
        gateway.ensure_schema().await?;
        Ok(gateway)
    }

    async fn ensure_schema(&self) -> Result<(), DomainError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            "CREATE TABLE IF NOT EXISTS user_roles (
                user_id INTEGER NOT NULL REFERENCES users(id),
                role TEXT NOT NULL,
                PRIMARY KEY (user_id, role)
            )",
            "CREATE TABLE IF NOT EXISTS inventory (
                user_id INTEGER NOT NULL REFERENCES users(id),
                item_name TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS room_templates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                width REAL NOT NULL,
                height REAL NOT NULL,
                skew_angle REAL NOT NULL DEFAULT 0,
                texture_path TEXT NOT NULL DEFAULT '',
                default_layout TEXT NOT NULL DEFAULT '',
                editable INTEGER NOT NULL DEFAULT 1
            )",
            "CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                owner_id INTEGER NOT NULL REFERENCES users(id),
                template_id INTEGER REFERENCES room_templates(id),
                pin TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (owner_id, name)
            )",
            "CREATE TABLE IF NOT EXISTS room_objects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL REFERENCES rooms(id),
                uid TEXT NOT NULL,
                name TEXT NOT NULL,
                sprite_path TEXT NOT NULL,
                tx REAL NOT NULL,
                ty REAL NOT NULL,
                rotation REAL NOT NULL DEFAULT 0,
                scale REAL NOT NULL DEFAULT 1,
                interactable INTEGER NOT NULL DEFAULT 0,
                color TEXT,
                UNIQUE (room_id, uid)
            )",
            "CREATE TABLE IF NOT EXISTS room_players (
                room_id INTEGER NOT NULL REFERENCES rooms(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (room_id, user_id)
            )",
            "CREATE TABLE IF NOT EXISTS player_positions (
                room_id INTEGER NOT NULL REFERENCES rooms(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                tx REAL NOT NULL,
                ty REAL NOT NULL,
                PRIMARY KEY (room_id, user_id)
            )",
            "CREATE TABLE IF NOT EXISTS chat_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL REFERENCES rooms(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                message TEXT NOT NULL,
                sent_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            // A usable template out of the box for fresh databases
            "INSERT INTO room_templates (name, width, height, skew_angle, texture_path)
             SELECT 'Classic', 10, 10, 26.57, 'assets/templates/classic.png'
             WHERE NOT EXISTS (SELECT 1 FROM room_templates)",
        ];
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        Ok(())
    }

    async fn insert_room(
        &self,
        name: &str,
        owner_id: UserId,
        template_id: Option<TemplateId>,
        pin: Option<&str>,
    ) -> Result<RoomId, DomainError> {
        let result =
            sqlx::query("INSERT INTO rooms (name, owner_id, template_id, pin) VALUES (?, ?, ?, ?)")
                .bind(name)
                .bind(owner_id.as_i64())
                .bind(template_id.map(|t| t.as_i64()))
                .bind(pin)
                .execute(&self.pool)
                .await;
        match result {
            Ok(done) => Ok(RoomId::new(done.last_insert_rowid())),
            Err(err) if is_unique_violation(&err) => Err(DomainError::validation(
                "you already have a room with that name",
            )),
            Err(err) => Err(db_err(err)),
        }
    }

    /// Grant a role to a user; idempotent. Roles take effect on the user's
    /// next authenticate.
    pub async fn grant_role(&self, user_id: UserId, role: &str) -> Result<(), DomainError> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id.as_i64())
            .bind(role)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

fn db_err(err: sqlx::Error) -> DomainError {
    DomainError::persistence(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn furniture_from_row(row: &SqliteRow) -> Result<FurnitureItem, sqlx::Error> {
    Ok(FurnitureItem {
        id: row.try_get("id")?,
        uid: row.try_get("uid")?,
        name: row.try_get("name")?,
        sprite_path: row.try_get("sprite_path")?,
        tx: row.try_get("tx")?,
        ty: row.try_get("ty")?,
        rotation: row.try_get("rotation")?,
        scale: row.try_get("scale")?,
        interactable: row.try_get("interactable")?,
        color: row.try_get("color")?,
    })
}

fn template_from_row(row: &SqliteRow) -> Result<RoomTemplate, sqlx::Error> {
    Ok(RoomTemplate {
        id: TemplateId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        skew_angle: row.try_get("skew_angle")?,
        texture_path: row.try_get("texture_path")?,
        default_layout: row.try_get("default_layout")?,
        editable: row.try_get("editable")?,
    })
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserProfile, DomainError> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        // Unknown user and wrong password produce the same error
        let Some(row) = row else {
            return Err(DomainError::authentication("invalid credentials"));
        };
        let stored: String = row.try_get("password_hash").map_err(db_err)?;
        if stored != hash_password(password) {
            return Err(DomainError::authentication("invalid credentials"));
        }

        Ok(UserProfile {
            id: UserId::new(row.try_get("id").map_err(db_err)?),
            username: row.try_get("username").map_err(db_err)?,
            roles: Default::default(),
            inventory: Vec::new(),
        })
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<UserId, DomainError> {
        let result = sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(hash_password(password))
            .execute(&self.pool)
            .await;
        let user_id = match result {
            Ok(done) => UserId::new(done.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => {
                return Err(DomainError::validation("registration failed"))
            }
            Err(err) => return Err(db_err(err)),
        };
        self.grant_role(user_id, role).await?;
        Ok(user_id)
    }

    async fn is_email_registered(&self, email: &str) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?) AS present")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("present").map_err(db_err)
    }

    async fn is_username_registered(&self, username: &str) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?) AS present")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("present").map_err(db_err)
    }

    async fn create_room(&self, spec: &RoomSpec) -> Result<RoomId, DomainError> {
        self.insert_room(&spec.name, spec.owner_id, None, spec.pin.as_deref())
            .await
    }

    async fn create_room_from_template<'a>(
        &self,
        owner_id: UserId,
        template_id: TemplateId,
        name: &str,
        pin: Option<&'a str>,
    ) -> Result<RoomId, DomainError> {
        // Surface a template error now instead of a dangling reference later
        self.get_room_template(template_id).await?;
        self.insert_room(name, owner_id, Some(template_id), pin).await
    }

    async fn get_public_room_id_by_name(&self, name: &str) -> Result<Option<RoomId>, DomainError> {
        let row = sqlx::query("SELECT id FROM rooms WHERE name = ? AND pin IS NULL LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.try_get("id").map(RoomId::new).map_err(db_err))
            .transpose()
    }

    async fn get_room_id_by_owner<'a>(
        &self,
        name: &str,
        owner_id: UserId,
        pin: Option<&'a str>,
    ) -> Result<Option<RoomId>, DomainError> {
        let row = sqlx::query("SELECT id, pin FROM rooms WHERE name = ? AND owner_id = ?")
            .bind(name)
            .bind(owner_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let stored: Option<String> = row.try_get("pin").map_err(db_err)?;
        // A pinned room only resolves with its pin; a mismatch is a miss
        if stored.as_deref() != pin && stored.is_some() {
            return Ok(None);
        }
        Ok(Some(RoomId::new(row.try_get("id").map_err(db_err)?)))
    }

    async fn list_rooms_by_popularity(&self) -> Result<Vec<RoomSummary>, DomainError> {
        let rows = sqlx::query(
            "SELECT r.id, r.name, r.owner_id, r.pin IS NULL AS is_public,
                    COUNT(p.user_id) AS player_count
             FROM rooms r
             LEFT JOIN room_players p ON p.room_id = r.id
             GROUP BY r.id
             ORDER BY player_count DESC, r.name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(RoomSummary {
                    id: RoomId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                    owner_id: UserId::new(row.try_get("owner_id")?),
                    is_public: row.try_get("is_public")?,
                    player_count: row.try_get("player_count")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(db_err)
    }

    async fn list_room_templates(&self) -> Result<Vec<RoomTemplate>, DomainError> {
        let rows = sqlx::query("SELECT * FROM room_templates ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(template_from_row)
            .collect::<Result<_, sqlx::Error>>()
            .map_err(db_err)
    }

    async fn get_room_template(
        &self,
        template_id: TemplateId,
    ) -> Result<RoomTemplate, DomainError> {
        let row = sqlx::query("SELECT * FROM room_templates WHERE id = ?")
            .bind(template_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match row {
            Some(row) => template_from_row(&row).map_err(db_err),
            None => Err(DomainError::not_found("template", template_id.to_string())),
        }
    }

    async fn get_room_furniture(&self, room_id: RoomId) -> Result<Vec<FurnitureItem>, DomainError> {
        let rows = sqlx::query("SELECT * FROM room_objects WHERE room_id = ? ORDER BY id")
            .bind(room_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(furniture_from_row)
            .collect::<Result<_, sqlx::Error>>()
            .map_err(db_err)
    }

    async fn add_furniture(
        &self,
        room_id: RoomId,
        item: &FurnitureItem,
    ) -> Result<i64, DomainError> {
        let result = sqlx::query(
            "INSERT INTO room_objects
                (room_id, uid, name, sprite_path, tx, ty, rotation, scale, interactable, color)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(room_id.as_i64())
        .bind(&item.uid)
        .bind(&item.name)
        .bind(&item.sprite_path)
        .bind(item.tx)
        .bind(item.ty)
        .bind(item.rotation)
        .bind(item.scale)
        .bind(item.interactable)
        .bind(&item.color)
        .execute(&self.pool)
        .await;
        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => Err(DomainError::validation(
                "a furniture item with that uid already exists in this room",
            )),
            Err(err) => Err(db_err(err)),
        }
    }

    async fn update_furniture(
        &self,
        room_id: RoomId,
        uid: &str,
        tx: f32,
        ty: f32,
    ) -> Result<Option<FurnitureItem>, DomainError> {
        let done = sqlx::query("UPDATE room_objects SET tx = ?, ty = ? WHERE room_id = ? AND uid = ?")
            .bind(tx)
            .bind(ty)
            .bind(room_id.as_i64())
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Ok(None);
        }
        let row = sqlx::query("SELECT * FROM room_objects WHERE room_id = ? AND uid = ?")
            .bind(room_id.as_i64())
            .bind(uid)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        furniture_from_row(&row).map(Some).map_err(db_err)
    }

    async fn set_presence(
        &self,
        room_id: RoomId,
        user_id: UserId,
        presence: Presence,
    ) -> Result<(), DomainError> {
        let query = match presence {
            Presence::Enter => {
                sqlx::query("INSERT OR REPLACE INTO room_players (room_id, user_id) VALUES (?, ?)")
            }
            Presence::Leave => {
                sqlx::query("DELETE FROM room_players WHERE room_id = ? AND user_id = ?")
            }
        };
        query
            .bind(room_id.as_i64())
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_presence(&self, room_id: RoomId) -> Result<Vec<UserId>, DomainError> {
        let rows = sqlx::query("SELECT user_id FROM room_players WHERE room_id = ? ORDER BY user_id")
            .bind(room_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| row.try_get("user_id").map(UserId::new))
            .collect::<Result<_, sqlx::Error>>()
            .map_err(db_err)
    }

    async fn get_user_roles(&self, user_id: UserId) -> Result<Vec<String>, DomainError> {
        let rows = sqlx::query("SELECT role FROM user_roles WHERE user_id = ? ORDER BY role")
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| row.try_get("role"))
            .collect::<Result<_, sqlx::Error>>()
            .map_err(db_err)
    }

    async fn get_user_inventory(&self, user_id: UserId) -> Result<Vec<String>, DomainError> {
        let rows = sqlx::query("SELECT item_name FROM inventory WHERE user_id = ? ORDER BY rowid")
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| row.try_get("item_name"))
            .collect::<Result<_, sqlx::Error>>()
            .map_err(db_err)
    }

    async fn append_chat_message(
        &self,
        room_id: RoomId,
        user_id: UserId,
        text: &str,
    ) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO chat_log (room_id, user_id, message) VALUES (?, ?, ?)")
            .bind(room_id.as_i64())
            .bind(user_id.as_i64())
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_player_position(
        &self,
        room_id: RoomId,
        user_id: UserId,
        tx: f32,
        ty: f32,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT OR REPLACE INTO player_positions (room_id, user_id, tx, ty) VALUES (?, ?, ?, ?)",
        )
        .bind(room_id.as_i64())
        .bind(user_id.as_i64())
        .bind(tx)
        .bind(ty)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn gateway() -> SqliteGateway {
        SqliteGateway::connect("sqlite::memory:")
            .await
            .expect("in-memory database")
    }

    fn chair(uid: &str) -> FurnitureItem {
        FurnitureItem {
            id: 0,
            uid: uid.to_string(),
            name: "chair".into(),
            sprite_path: "assets/furniture/chair.png".into(),
            tx: 3.0,
            ty: 4.0,
            rotation: 0.0,
            scale: 1.0,
            interactable: false,
            color: Some("#ff0000".into()),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let gw = gateway().await;
        let user_id = gw
            .create_user("dame", "dame@example.com", "hunter22", "user")
            .await
            .unwrap();

        let profile = gw.authenticate_user("dame", "hunter22").await.unwrap();
        assert_eq!(profile.id, user_id);
        assert_eq!(profile.username, "dame");

        let err = gw.authenticate_user("dame", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::Authentication(_)));
        let err = gw.authenticate_user("nobody", "hunter22").await.unwrap_err();
        assert!(matches!(err, DomainError::Authentication(_)));
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_validation_error() {
        let gw = gateway().await;
        gw.create_user("dame", "dame@example.com", "pw", "user").await.unwrap();

        let err = gw
            .create_user("dame", "other@example.com", "pw", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = gw
            .create_user("other", "dame@example.com", "pw", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn availability_checks() {
        let gw = gateway().await;
        assert!(!gw.is_email_registered("dame@example.com").await.unwrap());
        gw.create_user("dame", "dame@example.com", "pw", "user").await.unwrap();
        assert!(gw.is_email_registered("dame@example.com").await.unwrap());
        assert!(gw.is_username_registered("dame").await.unwrap());
        assert!(!gw.is_username_registered("other").await.unwrap());
    }

    #[tokio::test]
    async fn public_and_pinned_room_lookup() {
        let gw = gateway().await;
        let owner = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();

        let lobby = gw
            .create_room(&RoomSpec {
                name: "Lobby".into(),
                owner_id: owner,
                pin: None,
            })
            .await
            .unwrap();
        let vault = gw
            .create_room(&RoomSpec {
                name: "Vault".into(),
                owner_id: owner,
                pin: Some("1234".into()),
            })
            .await
            .unwrap();

        assert_eq!(
            gw.get_public_room_id_by_name("Lobby").await.unwrap(),
            Some(lobby)
        );
        // Pinned rooms never resolve through the public lookup
        assert_eq!(gw.get_public_room_id_by_name("Vault").await.unwrap(), None);
        assert_eq!(
            gw.get_room_id_by_owner("Vault", owner, Some("1234"))
                .await
                .unwrap(),
            Some(vault)
        );
        // Wrong pin, missing pin, and wrong owner are all the same miss
        assert_eq!(
            gw.get_room_id_by_owner("Vault", owner, Some("9999"))
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            gw.get_room_id_by_owner("Vault", owner, None).await.unwrap(),
            None
        );
        let stranger = gw.create_user("other", "o@e.com", "pw", "user").await.unwrap();
        assert_eq!(
            gw.get_room_id_by_owner("Vault", stranger, Some("1234"))
                .await
                .unwrap(),
            None
        );
        // Owner-scoped lookup also resolves the owner's pinless rooms
        assert_eq!(
            gw.get_room_id_by_owner("Lobby", owner, None).await.unwrap(),
            Some(lobby)
        );
    }

    #[tokio::test]
    async fn duplicate_room_name_per_owner_is_rejected() {
        let gw = gateway().await;
        let owner = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();
        let spec = RoomSpec {
            name: "Lobby".into(),
            owner_id: owner,
            pin: None,
        };
        gw.create_room(&spec).await.unwrap();
        assert!(matches!(
            gw.create_room(&spec).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn template_rooms_require_an_existing_template() {
        let gw = gateway().await;
        let owner = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();

        let err = gw
            .create_room_from_template(owner, TemplateId::new(999), "Lobby", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let template = gw.list_room_templates().await.unwrap()[0].id;
        let room = gw
            .create_room_from_template(owner, template, "Lobby", None)
            .await
            .unwrap();
        assert_eq!(
            gw.get_public_room_id_by_name("Lobby").await.unwrap(),
            Some(room)
        );
    }

    #[tokio::test]
    async fn templates_are_seeded_and_fetchable() {
        let gw = gateway().await;
        let templates = gw.list_room_templates().await.unwrap();
        assert!(!templates.is_empty());
        let first = gw.get_room_template(templates[0].id).await.unwrap();
        assert_eq!(first.name, templates[0].name);
    }

    #[tokio::test]
    async fn furniture_add_update_and_list() {
        let gw = gateway().await;
        let owner = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();
        let room = gw
            .create_room(&RoomSpec {
                name: "Lobby".into(),
                owner_id: owner,
                pin: None,
            })
            .await
            .unwrap();

        let id = gw.add_furniture(room, &chair("c-1")).await.unwrap();
        assert!(id > 0);

        let moved = gw
            .update_furniture(room, "c-1", 7.0, 8.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((moved.tx, moved.ty), (7.0, 8.0));
        assert_eq!(moved.color.as_deref(), Some("#ff0000"));

        assert!(gw.update_furniture(room, "ghost", 0.0, 0.0).await.unwrap().is_none());

        let items = gw.get_room_furniture(room).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].uid, "c-1");
    }

    #[tokio::test]
    async fn duplicate_furniture_uid_is_rejected() {
        let gw = gateway().await;
        let owner = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();
        let room = gw
            .create_room(&RoomSpec {
                name: "Lobby".into(),
                owner_id: owner,
                pin: None,
            })
            .await
            .unwrap();
        gw.add_furniture(room, &chair("c-1")).await.unwrap();
        assert!(matches!(
            gw.add_furniture(room, &chair("c-1")).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn presence_feeds_popularity_ordering() {
        let gw = gateway().await;
        let a = gw.create_user("a", "a@e.com", "pw", "user").await.unwrap();
        let b = gw.create_user("b", "b@e.com", "pw", "user").await.unwrap();
        let quiet = gw
            .create_room(&RoomSpec {
                name: "Quiet".into(),
                owner_id: a,
                pin: None,
            })
            .await
            .unwrap();
        let busy = gw
            .create_room(&RoomSpec {
                name: "Busy".into(),
                owner_id: a,
                pin: None,
            })
            .await
            .unwrap();

        gw.set_presence(busy, a, Presence::Enter).await.unwrap();
        gw.set_presence(busy, b, Presence::Enter).await.unwrap();
        gw.set_presence(quiet, a, Presence::Enter).await.unwrap();

        let rooms = gw.list_rooms_by_popularity().await.unwrap();
        assert_eq!(rooms[0].name, "Busy");
        assert_eq!(rooms[0].player_count, 2);
        assert_eq!(rooms[1].player_count, 1);
        assert_eq!(gw.list_presence(busy).await.unwrap(), vec![a, b]);

        // Re-entering is idempotent; leaving decrements
        gw.set_presence(busy, b, Presence::Enter).await.unwrap();
        gw.set_presence(busy, b, Presence::Leave).await.unwrap();
        let rooms = gw.list_rooms_by_popularity().await.unwrap();
        let busy_row = rooms.iter().find(|r| r.name == "Busy").unwrap();
        assert_eq!(busy_row.player_count, 1);
    }

    #[tokio::test]
    async fn new_accounts_carry_their_initial_role_only() {
        let gw = gateway().await;
        let user = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();
        assert_eq!(gw.get_user_roles(user).await.unwrap(), vec!["user"]);
        assert!(gw.get_user_inventory(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn granted_roles_are_returned_once() {
        let gw = gateway().await;
        let user = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();
        gw.grant_role(user, "admin").await.unwrap();
        gw.grant_role(user, "admin").await.unwrap();
        assert_eq!(gw.get_user_roles(user).await.unwrap(), vec!["admin", "user"]);
    }

    #[tokio::test]
    async fn chat_and_positions_persist_without_error() {
        let gw = gateway().await;
        let user = gw.create_user("dame", "d@e.com", "pw", "user").await.unwrap();
        let room = gw
            .create_room(&RoomSpec {
                name: "Lobby".into(),
                owner_id: user,
                pin: None,
            })
            .await
            .unwrap();
        gw.append_chat_message(room, user, "hello").await.unwrap();
        gw.update_player_position(room, user, 1.0, 2.0).await.unwrap();
        gw.update_player_position(room, user, 3.0, 4.0).await.unwrap();
    }
}
