//! Document database endpoints: create and structured equality queries.

use engine::{Credentials, Document, DocumentStore, FieldValue, Fields, ProviderError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    client::Backend,
    error::BackendError,
    values::{decode_fields, encode, encode_fields},
};

#[derive(Debug, Serialize)]
struct WriteDocument {
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    /// Full resource name, ending with `/{collection}/{id}`.
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// One element of a query answer stream. Rows without a document only carry
/// progress information.
#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<WireDocument>,
}

impl WireDocument {
    fn id(&self) -> Result<&str, BackendError> {
        self.name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BackendError::Decode(format!("invalid document name: {}", self.name)))
    }

    fn into_document(self) -> Result<Document, BackendError> {
        Ok(Document {
            id: self.id()?.to_string(),
            fields: decode_fields(&self.fields),
        })
    }
}

fn equality_query(collection: &str, field: &str, value: &FieldValue) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": encode(value),
                }
            }
        }
    })
}

impl Backend {
    fn documents_url(&self) -> String {
        Self::url(
            &self.config.firestore_url,
            &format!(
                "projects/{}/databases/{}/documents",
                self.config.project_id, self.config.database
            ),
        )
    }
}

impl DocumentStore for Backend {
    async fn insert(
        &self,
        collection: &str,
        fields: Fields,
        credentials: Option<&Credentials>,
    ) -> Result<String, ProviderError> {
        let url = Self::url(&self.documents_url(), collection);
        let body = WriteDocument {
            fields: encode_fields(&fields),
        };
        let bearer = credentials.map(|c| c.id_token.as_str());

        let created = self
            .post_json::<_, WireDocument>(&url, bearer, &body)
            .await?;
        Ok(created.id()?.to_string())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: FieldValue,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<Document>, ProviderError> {
        let url = format!("{}:runQuery", self.documents_url());
        let body = equality_query(collection, field, &value);
        let bearer = credentials.map(|c| c.id_token.as_str());

        let rows = self
            .post_json::<_, Vec<QueryRow>>(&url, bearer, &body)
            .await?;
        let documents = rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(WireDocument::into_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }
}
