//! # Stage Manager
//!
//! Sales pipeline stages. Names and positions are both unique.

use tracing::{info, warn};

use crate::db::queries::stages;
use crate::db::{Database, StageFields};
use crate::models::{StageRequest, StageResponse};
use crate::utils::require_text;

use super::error::{blocked_on_reference, rejected_on_unique};
use super::CrmError;

const MAX_NAME_LEN: usize = 100;

pub fn validate_stage(req: &StageRequest) -> Result<StageFields, CrmError> {
    let mut problems = Vec::new();

    let name = require_text(&mut problems, "name", &req.name, Some(MAX_NAME_LEN));
    if req.position < 0 {
        problems.push("position cannot be negative".to_string());
    }

    if !problems.is_empty() {
        return Err(CrmError::Validation(problems));
    }

    Ok(StageFields {
        name,
        position: req.position,
    })
}

/// Turn the (name_taken, position_taken) pair into a rejection, if any.
fn check_conflicts(name_taken: bool, position_taken: bool) -> Result<(), CrmError> {
    match (name_taken, position_taken) {
        (false, false) => Ok(()),
        (true, false) => {
            Err(CrmError::BusinessRule("a stage with this name already exists".into()))
        }
        (false, true) => Err(CrmError::BusinessRule("a stage already uses this position".into())),
        (true, true) => Err(CrmError::BusinessRule(
            "a stage with this name already exists and the position is taken".into(),
        )),
    }
}

#[derive(Clone)]
pub struct StageManager {
    db: Database,
}

impl StageManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<StageResponse>, CrmError> {
        let rows = stages::list_stages(self.db.pool()).await?;
        Ok(rows.iter().map(StageResponse::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<StageResponse, CrmError> {
        stages::get_stage(self.db.pool(), id)
            .await?
            .map(|s| StageResponse::from(&s))
            .ok_or_else(|| stage_not_found(id))
    }

    pub async fn create(&self, req: &StageRequest) -> Result<StageResponse, CrmError> {
        let fields = validate_stage(req)?;

        let (name_taken, position_taken) =
            stages::stage_conflicts(self.db.pool(), &fields, None).await?;
        check_conflicts(name_taken, position_taken)?;

        let stage = stages::insert_stage(self.db.pool(), &fields)
            .await
            .map_err(|e| rejected_on_unique(e, "stage name or position already in use"))?;

        info!("Stage created: {} at position {}", stage.name, stage.position);

        Ok(StageResponse::from(&stage))
    }

    pub async fn update(&self, id: i32, req: &StageRequest) -> Result<StageResponse, CrmError> {
        let fields = validate_stage(req)?;

        if stages::get_stage(self.db.pool(), id).await?.is_none() {
            return Err(stage_not_found(id));
        }

        let (name_taken, position_taken) =
            stages::stage_conflicts(self.db.pool(), &fields, Some(id)).await?;
        check_conflicts(name_taken, position_taken)?;

        let stage = stages::update_stage(self.db.pool(), id, &fields)
            .await
            .map_err(|e| rejected_on_unique(e, "stage name or position already in use"))?
            .ok_or_else(|| stage_not_found(id))?;

        info!("Stage {} updated", id);

        Ok(StageResponse::from(&stage))
    }

    pub async fn delete(&self, id: i32) -> Result<(), CrmError> {
        if stages::get_stage(self.db.pool(), id).await?.is_none() {
            return Err(stage_not_found(id));
        }

        if stages::stage_in_use(self.db.pool(), id).await? {
            warn!("Refusing to delete stage {} with opportunities", id);
            return Err(CrmError::BusinessRule(
                "cannot delete a stage that has opportunities".to_string(),
            ));
        }

        let deleted = stages::delete_stage(self.db.pool(), id)
            .await
            .map_err(|e| blocked_on_reference(e, "cannot delete a stage that has opportunities"))?;
        if !deleted {
            return Err(stage_not_found(id));
        }

        info!("Stage {} deleted", id);
        Ok(())
    }
}

fn stage_not_found(id: i32) -> CrmError {
    CrmError::NotFound(format!("stage {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_stage() {
        let fields = validate_stage(&StageRequest {
            name: " Negotiation ".into(),
            position: 3,
        })
        .unwrap();
        assert_eq!(fields.name, "Negotiation");

        assert!(validate_stage(&StageRequest { name: "".into(), position: -1 }).is_err());
    }

    #[test]
    fn test_check_conflicts() {
        assert!(check_conflicts(false, false).is_ok());
        assert!(matches!(
            check_conflicts(true, false),
            Err(CrmError::BusinessRule(m)) if m.contains("name")
        ));
        assert!(matches!(
            check_conflicts(false, true),
            Err(CrmError::BusinessRule(m)) if m.contains("position")
        ));
        assert!(check_conflicts(true, true).is_err());
    }
}
