//! Records and engine setups shared by the integration tests.

use std::sync::Arc;

use recorder_common::{RecorderConfig, Value};
use recorder_query::{AnsiAdapter, Recorder, SqlAdapter};
use recorder_schema::{record, ForeignKey, Opaque, PrimaryKey};

use crate::mock::MockDatabase;

record! {
    /// A user row.
    #[derive(Debug, Clone, PartialEq)]
    pub struct User as "Users" {
        /// Generated key.
        pub id: PrimaryKey<i64>,
        /// Display name.
        pub name: String,
        /// Age in years.
        pub age: i32,
    }
}

impl User {
    /// Creates a user with an assigned key.
    pub fn with_id(id: i64, name: &str, age: i32) -> Self {
        Self {
            id: PrimaryKey::of(id),
            name: name.to_string(),
            age,
        }
    }

    /// Returns the row the database would hold for this user.
    pub fn row(&self) -> Vec<Value> {
        vec![
            self.id.get().map_or(Value::Null, |id| Value::Long(*id)),
            Value::Text(self.name.clone()),
            Value::Int(self.age),
        ]
    }
}

record! {
    /// A team that members belong to.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Team as "Teams" {
        /// Generated key.
        pub id: PrimaryKey<i32>,
        /// Unique team name.
        pub name: String [unique],
    }
}

record! {
    /// A team membership.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Member as "Members" {
        /// Generated key.
        pub id: PrimaryKey<i64>,
        /// Owning team.
        pub team: ForeignKey<Team>,
        /// Member name.
        pub name: String,
        /// Optional nickname.
        pub nickname: Option<String>,
    }
}

/// Token stored as a driver-native object.
#[derive(Debug, PartialEq, Eq)]
pub struct Token(pub u64);

record! {
    /// One field of every supported kind.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Sample {
        /// Caller-assigned key.
        pub id: PrimaryKey<i64> [not_generated],
        /// Flag.
        pub flag: bool,
        /// Tiny integer.
        pub tiny: i8,
        /// Small integer.
        pub small: i16,
        /// Regular integer.
        pub count: i32,
        /// Large integer.
        pub large: i64,
        /// Single precision.
        pub ratio: f32,
        /// Double precision.
        pub score: f64,
        /// Text.
        pub label: String,
        /// Optional integer.
        pub maybe_count: Option<i32>,
        /// Optional text.
        pub maybe_label: Option<String>,
        /// Reference to a team.
        pub team: ForeignKey<Team>,
        /// Driver-native token.
        pub token: Opaque<Token>,
    }
}

/// Builds an ANSI engine over `db` with default configuration.
pub fn recorder(db: &MockDatabase) -> Recorder {
    recorder_with(db, Arc::new(AnsiAdapter::new()), RecorderConfig::default())
}

/// Builds an engine over `db`.
///
/// # Panics
///
/// Panics if `config` is invalid.
pub fn recorder_with(
    db: &MockDatabase,
    adapter: Arc<dyn SqlAdapter>,
    config: RecorderConfig,
) -> Recorder {
    match Recorder::new(Arc::new(db.clone()), adapter, config) {
        Ok(recorder) => recorder,
        Err(e) => panic!("invalid test configuration: {}", e),
    }
}
