//! # Client Manager
//!
//! Client CRUD and lookups. A client's NIT (tax id) is unique, and a client
//! that has any opportunity can no longer be deleted.

use tracing::{info, warn};

use crate::db::queries::{clients, opportunities};
use crate::db::{ClientFields, Database};
use crate::models::{
    ClientDetailResponse, ClientOpportunitiesResponse, ClientOpportunitySummary, ClientRef,
    ClientRequest, ClientResponse, ClientSummaryResponse, ListResponse, OpportunityListItem,
};
use crate::utils::{non_blank, require_text};

use super::error::{blocked_on_reference, rejected_on_unique};
use super::CrmError;

/// Longest accepted email address.
const MAX_EMAIL_LEN: usize = 255;

/// Shortest accepted name search fragment.
pub const MIN_SEARCH_LEN: usize = 2;

const DUPLICATE_NIT: &str = "a client with this NIT already exists";

/// Validate a client body into the fields to store.
pub fn validate_client(req: &ClientRequest) -> Result<ClientFields, CrmError> {
    let mut problems = Vec::new();

    let name = require_text(&mut problems, "name", &req.name, None);
    let nit = require_text(&mut problems, "nit", &req.nit, None);
    let address = require_text(&mut problems, "address", &req.address, None);

    let email = non_blank(req.email.as_deref());
    if let Some(email) = &email {
        if email.chars().count() > MAX_EMAIL_LEN {
            problems.push(format!("email must be at most {} characters", MAX_EMAIL_LEN));
        } else if !email.contains('@') {
            problems.push("email is not a valid address".to_string());
        }
    }

    if !problems.is_empty() {
        return Err(CrmError::Validation(problems));
    }

    Ok(ClientFields { name, nit, address, email })
}

/// A search fragment, trimmed, of at least [`MIN_SEARCH_LEN`] characters.
pub fn search_fragment(raw: &str, what: &str) -> Result<String, CrmError> {
    let fragment = raw.trim();
    if fragment.chars().count() < MIN_SEARCH_LEN {
        return Err(CrmError::invalid(format!(
            "{} must be at least {} characters",
            what, MIN_SEARCH_LEN
        )));
    }
    Ok(fragment.to_string())
}

#[derive(Clone)]
pub struct ClientManager {
    db: Database,
}

impl ClientManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, req: &ClientRequest) -> Result<ClientResponse, CrmError> {
        let fields = validate_client(req)?;

        if clients::nit_taken(self.db.pool(), &fields.nit, None).await? {
            return Err(CrmError::BusinessRule(DUPLICATE_NIT.to_string()));
        }

        let client = clients::insert_client(self.db.pool(), &fields)
            .await
            .map_err(|e| rejected_on_unique(e, DUPLICATE_NIT))?;

        info!("Client created: {} (id {})", client.name, client.id);

        Ok(ClientResponse::from(&client))
    }

    pub async fn list(&self) -> Result<ListResponse<ClientSummaryResponse>, CrmError> {
        let rows = clients::list_clients(self.db.pool()).await?;
        Ok(ListResponse::new(rows.iter().map(ClientSummaryResponse::from).collect()))
    }

    /// Case-insensitive substring search on name.
    pub async fn search_by_name(
        &self,
        name: &str,
    ) -> Result<ListResponse<ClientSummaryResponse>, CrmError> {
        let fragment = search_fragment(name, "name")?;
        let rows = clients::search_clients_by_name(self.db.pool(), &fragment).await?;
        Ok(ListResponse::new(rows.iter().map(ClientSummaryResponse::from).collect()))
    }

    pub async fn get_by_nit(&self, nit: &str) -> Result<ClientSummaryResponse, CrmError> {
        clients::get_client_stats_by_nit(self.db.pool(), nit.trim())
            .await?
            .map(|s| ClientSummaryResponse::from(&s))
            .ok_or_else(|| CrmError::NotFound(format!("no client with NIT {}", nit.trim())))
    }

    /// A client with counters and a summary of its opportunities.
    pub async fn get(&self, id: i32) -> Result<ClientDetailResponse, CrmError> {
        let stats = clients::get_client_stats(self.db.pool(), id)
            .await?
            .ok_or_else(|| client_not_found(id))?;

        let opportunities = opportunities::list_opportunities_by_client(self.db.pool(), id).await?;

        Ok(ClientDetailResponse {
            summary: ClientSummaryResponse::from(&stats),
            opportunities: opportunities.iter().map(ClientOpportunitySummary::from).collect(),
        })
    }

    pub async fn update(&self, id: i32, req: &ClientRequest) -> Result<ClientResponse, CrmError> {
        if let Some(body_id) = req.id {
            if body_id != id {
                return Err(CrmError::invalid("client id in body does not match the URL"));
            }
        }

        let fields = validate_client(req)?;

        if clients::get_client(self.db.pool(), id).await?.is_none() {
            return Err(client_not_found(id));
        }

        if clients::nit_taken(self.db.pool(), &fields.nit, Some(id)).await? {
            return Err(CrmError::BusinessRule(
                "another client already uses this NIT".to_string(),
            ));
        }

        let client = clients::update_client(self.db.pool(), id, &fields)
            .await
            .map_err(|e| rejected_on_unique(e, DUPLICATE_NIT))?
            .ok_or_else(|| client_not_found(id))?;

        info!("Client {} updated", id);

        Ok(ClientResponse::from(&client))
    }

    pub async fn delete(&self, id: i32) -> Result<(), CrmError> {
        if clients::get_client(self.db.pool(), id).await?.is_none() {
            return Err(client_not_found(id));
        }

        if opportunities::client_has_opportunities(self.db.pool(), id).await? {
            warn!("Refusing to delete client {} with opportunities", id);
            return Err(CrmError::BusinessRule(
                "cannot delete a client that has opportunities".to_string(),
            ));
        }

        let deleted = clients::delete_client(self.db.pool(), id)
            .await
            .map_err(|e| blocked_on_reference(e, "cannot delete a client that has sales"))?;
        if !deleted {
            return Err(client_not_found(id));
        }

        info!("Client {} deleted", id);
        Ok(())
    }

    /// The client's opportunities with seller, vehicle, stage and counters.
    pub async fn opportunities(&self, id: i32) -> Result<ClientOpportunitiesResponse, CrmError> {
        let client = clients::get_client(self.db.pool(), id)
            .await?
            .ok_or_else(|| client_not_found(id))?;

        let rows = opportunities::list_opportunities_by_client(self.db.pool(), id).await?;
        let opportunities: Vec<OpportunityListItem> =
            rows.iter().map(OpportunityListItem::from).collect();

        Ok(ClientOpportunitiesResponse {
            client: ClientRef {
                id: client.id,
                name: client.name,
                nit: client.nit,
            },
            total: opportunities.len(),
            opportunities,
        })
    }
}

fn client_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("client {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{seed_pipeline, test_db, unique};

    fn request(name: &str, nit: &str, address: &str, email: Option<&str>) -> ClientRequest {
        ClientRequest {
            id: None,
            name: name.to_string(),
            nit: nit.to_string(),
            address: address.to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_client_trims_fields() {
        let fields =
            validate_client(&request(" Transportes Ruiz ", " 1234567-8", "Zona 10", Some("  ")))
                .unwrap();
        assert_eq!(fields.name, "Transportes Ruiz");
        assert_eq!(fields.nit, "1234567-8");
        assert_eq!(fields.email, None);
    }

    #[test]
    fn test_validate_client_reports_all_problems() {
        match validate_client(&request("", "", "", Some("not-an-email"))) {
            Err(CrmError::Validation(problems)) => {
                assert_eq!(problems.len(), 4);
                assert!(problems[0].contains("name"));
                assert!(problems[3].contains("email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_client_email_length() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_client(&request("A", "1", "B", Some(&long))).is_err());
    }

    #[test]
    fn test_search_fragment_minimum_length() {
        assert!(search_fragment(" a ", "name").is_err());
        assert_eq!(search_fragment(" ana ", "name").unwrap(), "ana");
    }

    #[tokio::test]
    async fn test_client_with_opportunities_is_kept() {
        let Some(db) = test_db().await else { return };
        let pipeline = seed_pipeline(&db).await;
        let manager = ClientManager::new(db);

        let err = manager.delete(pipeline.client_id).await.unwrap_err();
        assert!(matches!(err, CrmError::BusinessRule(ref m) if m.contains("opportunities")));
        assert!(manager.get(pipeline.client_id).await.is_ok());

        let idle = manager
            .create(&request("Agrícola Maya", &unique("nit"), "Zona 4", None))
            .await
            .unwrap();
        manager.delete(idle.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_nit_is_a_bad_request() {
        let Some(db) = test_db().await else { return };
        let manager = ClientManager::new(db);
        let nit = unique("nit");

        manager.create(&request("Transportes Ruiz", &nit, "Zona 10", None)).await.unwrap();
        let err = manager
            .create(&request("Otra Empresa", &nit, "Zona 1", None))
            .await
            .unwrap_err();

        assert_eq!(err.status().as_u16(), 400);
        assert_eq!(err.code(), "BUSINESS_RULE_VIOLATION");
    }
}
