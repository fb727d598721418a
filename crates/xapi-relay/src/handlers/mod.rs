//! Relay endpoint handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/xapi/statements` | Statement object or array, relayed to the LRS |
//! | `PUT` | `/xapi/statements?statementId=` | One statement; a body id must match |
//! | `GET` | `/xapi/statements`, `/xapi/agents`, `/xapi/about` | Passed through to the LRS |
//! | `POST` | `/xapi/replay` | Body: template statement; query: launch parameters |
//! | `POST` | `/flags` | Body: `{"flag","content_id","user","operation"}` |
//! | `POST` | `/states/{id}/fire` | Body: `{"content_id"?,"user"?}` |

pub mod flags;
pub mod lrs;
pub mod replay;
pub mod states;
pub mod statements;
