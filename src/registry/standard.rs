//! Fixed store table for the transformer test planning application

use super::{Registry, RegistryEntry};
use crate::error::McpResult;
use crate::propagation::Guard;
use crate::store::{StoreSchema, BASIC_DATA_KEY, FORM_FIELDS_KEY, INPUTS_KEY, RESULTS_KEY};

/// Root input store holding the transformer's basic data
pub const ROOT_STORE: &str = "transformerInputs";

/// Fields that must be filled in before any module is recomputed
pub const ROOT_REQUIRED_FIELDS: [&str; 3] = ["potencia_mva", "tensao_at", "tensao_bt"];

const ROOT_DEPENDENTS: [&str; 7] = [
    "losses",
    "impulse",
    "appliedVoltage",
    "inducedVoltage",
    "shortCircuit",
    "dielectricAnalysis",
    "globalInfo",
];

fn computed(store_id: &str, dependencies: &[&str], hook: &str) -> RegistryEntry {
    RegistryEntry::new(store_id)
        .depends_on(dependencies)
        .with_hook(hook)
        .with_schema(StoreSchema::with_object_sections(&[
            INPUTS_KEY,
            RESULTS_KEY,
            BASIC_DATA_KEY,
        ]))
}

pub(super) fn build() -> McpResult<Registry> {
    let root = RegistryEntry::new(ROOT_STORE)
        .propagates_to(&ROOT_DEPENDENTS)
        .with_guard(Guard::required_fields(FORM_FIELDS_KEY, &ROOT_REQUIRED_FIELDS))
        .with_schema(StoreSchema::with_object_sections(&[FORM_FIELDS_KEY]));

    Registry::new(vec![
        root,
        computed("losses", &[ROOT_STORE], "losses/process").propagates_to(&["temperatureRise"]),
        computed("impulse", &[ROOT_STORE], "impulse/process"),
        computed("appliedVoltage", &[ROOT_STORE], "appliedVoltage/process"),
        computed("inducedVoltage", &[ROOT_STORE], "inducedVoltage/process"),
        computed("shortCircuit", &[ROOT_STORE], "shortCircuit/process"),
        // recomputed from losses results only; basic data still reaches it
        computed("temperatureRise", &["losses"], "temperatureRise/process"),
        computed("dielectricAnalysis", &[ROOT_STORE], "dielectricAnalysis/process"),
        RegistryEntry::new("standards"),
        RegistryEntry::new("sessions"),
        computed("globalInfo", &[ROOT_STORE], "global-update"),
    ])?
    .with_root(ROOT_STORE)
}
