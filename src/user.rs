//! Purpose: Built-in `user` record type operated on by the CLI.
//! Exports: `User`, `Role`.
//! Role: Field table for the `[user]` sections the binary reads and writes.
//! Invariants: Field order here is the on-disk line order.

use recfile::api::{Field, Record, Variants};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Variants for Role {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("Admin", Role::Admin),
        ("Editor", Role::Editor),
        ("Viewer", Role::Viewer),
    ];
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Record for User {
    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("Name", |u: &User| u.name.as_ref(), |u, v| u.name = Some(v)),
            Field::scalar("Email", |u: &User| u.email.as_ref(), |u, v| u.email = Some(v)),
            Field::scalar("Age", |u: &User| u.age.as_ref(), |u, v| u.age = Some(v)),
            Field::scalar("Role", |u: &User| u.role.as_ref(), |u, v| u.role = Some(v)),
            Field::list("Tags", |u: &User| u.tags.as_ref(), |u, v| u.tags = Some(v)),
        ]
    }
}
