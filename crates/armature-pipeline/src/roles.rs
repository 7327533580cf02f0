/// Worker role attached to an implementation stage, inferred from where
/// the planned unit lives in the target tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerRole {
    FrontendEngineer,
    TestEngineer,
    BackendEngineer,
    SoftwareEngineer,
}

impl WorkerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FrontendEngineer => "frontend_engineer",
            Self::TestEngineer => "test_engineer",
            Self::BackendEngineer => "backend_engineer",
            Self::SoftwareEngineer => "software_engineer",
        }
    }
}

const UI_MARKERS: [&str; 6] = [
    "frontend",
    "component",
    "view",
    "page",
    "widget",
    "style",
];
const UI_TOKENS: [&str; 8] = ["ui", "ux", "tsx", "jsx", "vue", "css", "scss", "html"];
const TEST_TOKENS: [&str; 4] = ["test", "tests", "spec", "specs"];
const BACKEND_MARKERS: [&str; 7] = [
    "backend",
    "server",
    "service",
    "model",
    "database",
    "repository",
    "endpoint",
];
const BACKEND_TOKENS: [&str; 3] = ["api", "db", "handler"];

/// Infers the worker role from the file path, then the folder path, then
/// the node name. Rule order is part of the contract: UI markers win over
/// test markers, which win over backend markers.
pub fn infer_worker_role(
    file_path: Option<&str>,
    folder_path: Option<&str>,
    name: &str,
) -> WorkerRole {
    let haystack = file_path
        .filter(|path| !path.trim().is_empty())
        .or(folder_path.filter(|path| !path.trim().is_empty()))
        .unwrap_or(name)
        .to_ascii_lowercase();
    let tokens: Vec<&str> = haystack
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    if UI_MARKERS.iter().any(|marker| haystack.contains(marker))
        || tokens.iter().any(|token| UI_TOKENS.contains(token))
    {
        return WorkerRole::FrontendEngineer;
    }
    if tokens.iter().any(|token| TEST_TOKENS.contains(token)) {
        return WorkerRole::TestEngineer;
    }
    if BACKEND_MARKERS.iter().any(|marker| haystack.contains(marker))
        || tokens.iter().any(|token| BACKEND_TOKENS.contains(token))
    {
        return WorkerRole::BackendEngineer;
    }
    WorkerRole::SoftwareEngineer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_worker_role_test_path_expected_test_engineer() {
        let role = infer_worker_role(Some("tests/test_beta.py"), None, "Beta");
        assert_eq!(role, WorkerRole::TestEngineer);
    }

    #[test]
    fn infer_worker_role_ui_and_test_markers_expected_ui_wins() {
        let role = infer_worker_role(Some("frontend/tests/button.test.tsx"), None, "Button");
        assert_eq!(role, WorkerRole::FrontendEngineer);
    }

    #[test]
    fn infer_worker_role_backend_path_expected_backend_engineer() {
        let role = infer_worker_role(Some("src/api/orders.py"), None, "Orders");
        assert_eq!(role, WorkerRole::BackendEngineer);
    }

    #[test]
    fn infer_worker_role_no_path_expected_name_fallback() {
        assert_eq!(
            infer_worker_role(None, None, "Checkout page"),
            WorkerRole::FrontendEngineer
        );
        assert_eq!(
            infer_worker_role(None, None, "Alpha"),
            WorkerRole::SoftwareEngineer
        );
    }

    #[test]
    fn infer_worker_role_folder_path_expected_used_when_file_missing() {
        let role = infer_worker_role(None, Some("services/billing"), "Billing");
        assert_eq!(role, WorkerRole::BackendEngineer);
    }
}
