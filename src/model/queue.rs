use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use super::{user, Snowflake};

pub type Id = Snowflake;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Open,
    Closed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Closed => "closed",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown queue status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Status::Open),
            "closed" => Ok(Status::Closed),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// A member as stored: the user and the details shown next to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub user: user::Id,
    pub email: String,
    pub role: user::Role,
}

#[derive(Clone, Debug)]
pub struct Queue {
    pub id: Id,
    pub service_name: String,
    pub status: Status,
    /// Unix seconds.
    pub created_at: i64,
    /// Arrival order. The head of the line is `members[0]`.
    pub members: Vec<Member>,
}

impl Queue {
    pub fn new(id: Id, service_name: String, created_at: i64) -> Queue {
        Queue {
            id,
            service_name,
            status: Status::Open,
            created_at,
            members: Vec::new(),
        }
    }

    pub fn contains(&self, user: &user::Id) -> bool {
        self.members.iter().any(|member| &member.user == user)
    }

    /// 1-based position of `user`, if they are in this queue.
    pub fn position_of(&self, user: &user::Id) -> Option<usize> {
        self.members
            .iter()
            .position(|member| &member.user == user)
            .map(|index| index + 1)
    }

    pub fn head(&self) -> Option<&Member> {
        self.members.first()
    }
}
