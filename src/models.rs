/// One entry in the supported model catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// USD per million input tokens.
    pub input_cost: f64,
    /// USD per million output tokens.
    pub output_cost: f64,
}

/// Supported search models, in selector order.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "sonar",
        name: "Sonar",
        description: "Fast web search, $1/$1 per M tokens",
        input_cost: 1.0,
        output_cost: 1.0,
    },
    ModelInfo {
        id: "sonar-pro",
        name: "Sonar Pro",
        description: "Multi-step search, $3/$15 per M tokens",
        input_cost: 3.0,
        output_cost: 15.0,
    },
    ModelInfo {
        id: "sonar-reasoning-pro",
        name: "Sonar Reasoning Pro",
        description: "Deep reasoning, $2/$8 per M tokens",
        input_cost: 2.0,
        output_cost: 8.0,
    },
    ModelInfo {
        id: "sonar-deep-research",
        name: "Sonar Deep Research",
        description: "Exhaustive research, $2/$8 per M tokens",
        input_cost: 2.0,
        output_cost: 8.0,
    },
];

#[must_use]
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|model| model.id == id)
}

#[must_use]
pub fn is_known_model(id: &str) -> bool {
    find_model(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::{find_model, is_known_model};

    #[test]
    fn catalog_lookup_matches_exact_ids_only() {
        assert!(is_known_model("sonar"));
        assert!(is_known_model("sonar-deep-research"));
        assert!(!is_known_model("sonar-ultra"));
        assert!(!is_known_model("Sonar"));
    }

    #[test]
    fn catalog_entries_carry_pricing() {
        let model = find_model("sonar-pro").expect("sonar-pro should be in the catalog");
        assert!((model.output_cost - 15.0).abs() < f64::EPSILON);
    }
}
