use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Identity of a drink. A drink that has not yet been created on the server
/// is `Unsaved`; everything the server has handed back is `Persisted`.
///
/// On the wire the server uses plain integers. Negative numbers, `null` and a
/// missing `id` field all read as `Unsaved`, and `Unsaved` is written as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "Option<RawId>")]
pub enum DrinkId {
    #[default]
    Unsaved,
    Persisted(u64),
}

impl DrinkId {
    /// The server-side id, if there is one.
    pub fn persisted(self) -> Option<u64> {
        match self {
            DrinkId::Persisted(id) => Some(id),
            DrinkId::Unsaved => None,
        }
    }

    pub fn is_persisted(self) -> bool {
        matches!(self, DrinkId::Persisted(_))
    }
}

/// An id as it appears in JSON. Non-negative values are read as `u64` so the
/// full range survives.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Unsigned(u64),
    Signed(i64),
}

impl From<Option<RawId>> for DrinkId {
    fn from(raw: Option<RawId>) -> Self {
        match raw {
            Some(RawId::Unsigned(id)) => DrinkId::Persisted(id),
            Some(RawId::Signed(_)) | None => DrinkId::Unsaved,
        }
    }
}

impl Serialize for DrinkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DrinkId::Persisted(id) => serializer.serialize_u64(*id),
            DrinkId::Unsaved => serializer.serialize_i64(-1),
        }
    }
}

impl fmt::Display for DrinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrinkId::Persisted(id) => write!(f, "{}", id),
            DrinkId::Unsaved => f.write_str("unsaved"),
        }
    }
}

/// One line of a recipe.
///
/// The basic listing only exposes `color` and `parts`; `name` is reserved for
/// callers holding `get:drinks-detail`, so it is optional here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<f64>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, color: impl Into<String>, parts: f64) -> Self {
        Ingredient {
            name: Some(name.into()),
            color: color.into(),
            parts: Some(parts),
        }
    }
}

/// Parses the `name:color:parts` shorthand used on the command line.
impl FromStr for Ingredient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.splitn(3, ':');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(color), Some(parts)) if !name.is_empty() && !color.is_empty() => {
                let parts = parts
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid parts '{}': {}", parts, e))?;
                Ok(Ingredient::new(name, color, parts))
            }
            _ => Err(format!("expected name:color:parts, got '{}'", s)),
        }
    }
}

/// A drink as exchanged with the drinks API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drink {
    #[serde(default)]
    pub id: DrinkId,
    pub title: String,
    #[serde(default)]
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    /// A drink that has not been created on the server yet.
    pub fn unsaved(title: impl Into<String>, recipe: Vec<Ingredient>) -> Self {
        Drink {
            id: DrinkId::Unsaved,
            title: title.into(),
            recipe,
        }
    }

    /// The body sent on create and update. Only `title` and `recipe` go out.
    pub fn payload(&self) -> DrinkPayload<'_> {
        DrinkPayload {
            title: &self.title,
            recipe: &self.recipe,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinkPayload<'a> {
    pub title: &'a str,
    pub recipe: &'a [Ingredient],
}
