/*
 * Responsibility
 * - Todos の request/response DTO
 * - id はサーバ側で採番するため request には含めない (送られてきても無視)
 */
use serde::{Deserialize, Serialize};

use crate::repos::TodoRow;

#[derive(Debug, Deserialize)]
pub struct TodoRequest {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

impl From<TodoRow> for TodoResponse {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            completed: row.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_defaults_to_false_and_id_is_ignored() {
        let req: TodoRequest =
            serde_json::from_str(r#"{"id": 99, "title": "buy milk"}"#).unwrap();
        assert_eq!(req.title, "buy milk");
        assert!(!req.completed);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let req: TodoRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        assert_eq!(req.validate(), Err("title is required"));
    }
}
