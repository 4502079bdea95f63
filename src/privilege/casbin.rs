use crate::casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi};
use crate::core::models::event::EventScope;
use crate::core::permissions::{Actor, PermissionOracle, Predicate};
use crate::error::Error;

/// `*` in the subject column grants a predicate to everybody in the event.
const MODEL: &str = r#"
[request_definition]
r = sub, evt, pred

[policy_definition]
p = sub, evt, pred

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = (p.sub == "*" || r.sub == p.sub) && r.evt == p.evt && r.pred == p.pred
"#;

pub const EVERYONE: &str = "*";

pub struct CasbinOracle {
    enforcer: Enforcer,
}

impl CasbinOracle {
    pub async fn new(policies: Vec<Vec<String>>) -> Result<Self, Error> {
        let model = DefaultModel::from_str(MODEL).await?;
        let mut enforcer = Enforcer::new(model, MemoryAdapter::default()).await?;
        if !policies.is_empty() {
            enforcer.add_policies(policies).await?;
        }
        Ok(Self { enforcer })
    }

    pub async fn grant(&mut self, subject: &str, scope: &EventScope, predicate: Predicate) -> Result<bool, Error> {
        let added = self
            .enforcer
            .add_policy(vec![subject.to_owned(), scope.slug.clone(), predicate.as_str().to_owned()])
            .await?;
        Ok(added)
    }
}

impl PermissionOracle for CasbinOracle {
    fn holds(&self, predicate: Predicate, actor: &Actor, scope: &EventScope) -> bool {
        match self.enforcer.enforce((actor.subject(), scope.slug.as_str(), predicate.as_str())) {
            Ok(res) => res,
            Err(err) => {
                log::warn!("permission lookup {} for {} failed: {}", predicate, actor.subject(), err);
                false
            }
        }
    }
}
