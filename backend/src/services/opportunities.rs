//! # Opportunity Manager
//!
//! An opportunity ties a client to the seller handling the deal, the stage
//! it has reached and, optionally, the vehicle of interest.
//!
//! ## Reference Checks
//!
//! ```text
//! create / update
//!      │
//!      ├── client exists?   ──no──► 400 "client not found"
//!      ├── user exists?     ──no──► 400 "user not found"
//!      ├── stage exists?    ──no──► 400 "stage not found"
//!      └── vehicle given and exists? ──no──► 400 "vehicle not found"
//! ```

use tracing::{info, warn};

use crate::db::queries::{clients, opportunities, quotations, stages, users, vehicles};
use crate::db::{Database, OpportunityFields};
use crate::models::{
    ListResponse, OpportunityDetailResponse, OpportunityListItem, OpportunityRequest,
    OpportunityResponse,
};

use super::error::blocked_on_reference;
use super::CrmError;

#[derive(Clone)]
pub struct OpportunityManager {
    db: Database,
}

impl OpportunityManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<ListResponse<OpportunityListItem>, CrmError> {
        let rows = opportunities::list_opportunities(self.db.pool()).await?;
        Ok(ListResponse::new(rows.iter().map(OpportunityListItem::from).collect()))
    }

    pub async fn by_client(
        &self,
        client_id: i32,
    ) -> Result<ListResponse<OpportunityListItem>, CrmError> {
        let rows = opportunities::list_opportunities_by_client(self.db.pool(), client_id).await?;
        Ok(ListResponse::new(rows.iter().map(OpportunityListItem::from).collect()))
    }

    pub async fn by_user(&self, user_id: i32) -> Result<ListResponse<OpportunityListItem>, CrmError> {
        let rows = opportunities::list_opportunities_by_user(self.db.pool(), user_id).await?;
        Ok(ListResponse::new(rows.iter().map(OpportunityListItem::from).collect()))
    }

    /// Full detail with the opportunity's quotations.
    pub async fn get(&self, id: i32) -> Result<OpportunityDetailResponse, CrmError> {
        let row = opportunities::get_opportunity_row(self.db.pool(), id)
            .await?
            .ok_or_else(|| opportunity_not_found(id))?;

        let summaries = quotations::list_quotation_summaries(self.db.pool(), id).await?;

        Ok(OpportunityDetailResponse::new(&row, &summaries))
    }

    pub async fn create(&self, req: &OpportunityRequest) -> Result<OpportunityResponse, CrmError> {
        let fields = OpportunityFields {
            client_id: req.client_id,
            user_id: req.user_id,
            vehicle_id: req.vehicle_id,
            stage_id: req.stage_id,
            active: true,
        };
        self.check_references(&fields).await?;

        let opportunity = opportunities::insert_opportunity(self.db.pool(), &fields).await?;

        Ok(OpportunityResponse::from(&opportunity))
    }

    /// Replace every field, including `active`.
    pub async fn update(
        &self,
        id: i32,
        req: &OpportunityRequest,
    ) -> Result<OpportunityResponse, CrmError> {
        if opportunities::get_opportunity(self.db.pool(), id).await?.is_none() {
            return Err(opportunity_not_found(id));
        }

        let fields = OpportunityFields {
            client_id: req.client_id,
            user_id: req.user_id,
            vehicle_id: req.vehicle_id,
            stage_id: req.stage_id,
            active: req.active.unwrap_or(true),
        };
        self.check_references(&fields).await?;

        let opportunity = opportunities::update_opportunity(self.db.pool(), id, &fields)
            .await?
            .ok_or_else(|| opportunity_not_found(id))?;

        info!("Opportunity {} updated (stage {}, active {})", id, fields.stage_id, fields.active);

        Ok(OpportunityResponse::from(&opportunity))
    }

    pub async fn set_status(&self, id: i32, active: bool) -> Result<OpportunityResponse, CrmError> {
        let opportunity = opportunities::set_opportunity_active(self.db.pool(), id, active)
            .await?
            .ok_or_else(|| opportunity_not_found(id))?;

        info!("Opportunity {} active = {}", id, active);

        Ok(OpportunityResponse::from(&opportunity))
    }

    pub async fn delete(&self, id: i32) -> Result<(), CrmError> {
        if opportunities::get_opportunity(self.db.pool(), id).await?.is_none() {
            return Err(opportunity_not_found(id));
        }

        if opportunities::opportunity_has_quotations(self.db.pool(), id).await? {
            warn!("Refusing to delete opportunity {} with quotations", id);
            return Err(CrmError::BusinessRule(
                "cannot delete an opportunity that has quotations".to_string(),
            ));
        }

        let deleted = opportunities::delete_opportunity(self.db.pool(), id)
            .await
            .map_err(|e| blocked_on_reference(e, "cannot delete an opportunity that has quotations"))?;
        if !deleted {
            return Err(opportunity_not_found(id));
        }

        info!("Opportunity {} deleted", id);
        Ok(())
    }

    /// Every referenced row must exist. All missing references are reported together.
    async fn check_references(&self, fields: &OpportunityFields) -> Result<(), CrmError> {
        let pool = self.db.pool();
        let mut problems = Vec::new();

        if clients::get_client(pool, fields.client_id).await?.is_none() {
            problems.push("client not found".to_string());
        }
        if users::get_user(pool, fields.user_id).await?.is_none() {
            problems.push("user not found".to_string());
        }
        if stages::get_stage(pool, fields.stage_id).await?.is_none() {
            problems.push("stage not found".to_string());
        }
        if let Some(vehicle_id) = fields.vehicle_id {
            if vehicles::get_vehicle(pool, vehicle_id).await?.is_none() {
                problems.push("vehicle not found".to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CrmError::Validation(problems))
        }
    }
}

fn opportunity_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("opportunity {} not found", id))
}
