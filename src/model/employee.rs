use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A row of the `persona` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "nome": "Anna",
        "cognome": "Bianchi",
        "posizione": "Dev",
        "stipendio": 40000
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "Anna")]
    pub nome: String,

    #[schema(example = "Bianchi")]
    pub cognome: String,

    #[schema(example = "Dev")]
    pub posizione: String,

    #[schema(example = 40000)]
    pub stipendio: i64,
}

/// Employee fields without an id, used when the store picks the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub nome: String,
    pub cognome: String,
    pub posizione: String,
    pub stipendio: i64,
}

impl NewEmployee {
    pub fn with_id(self, id: i64) -> Employee {
        Employee {
            id,
            nome: self.nome,
            cognome: self.cognome,
            posizione: self.posizione,
            stipendio: self.stipendio,
        }
    }
}

/// Optional exact-match filters for listing; absent filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub name: Option<String>,
    pub surname: Option<String>,
}
