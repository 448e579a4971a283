pub mod api;
pub mod authorizer;
pub mod entitlements;
pub mod ledger;
pub mod models;
pub mod scheduler;

pub use authorizer::{SharedSecretAuthorizer, VerificationAuthorizer};
pub use entitlements::{Entitlement, EntitlementProjector};
pub use ledger::{PaymentOrder, SubscriptionLedger, VerificationOutcome};
pub use models::{
    PaymentIntent, PaymentStatus, PlanCatalogEntry, PlanType, Role, Subscription,
    SubscriptionStatus, PLAN_CATALOG,
};
pub use scheduler::{process_tick as run_lapse_sweep_tick, spawn as spawn_lapse_scheduler};
