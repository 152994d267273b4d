//! GitHub Actions workflow templates pushed into provisioned repositories.

use std::collections::BTreeMap;

use serde::Serialize;

/// Workflow definition document.
#[derive(Serialize)]
pub struct Workflow {
    name: &'static str,
    on: Vec<&'static str>,
    jobs: BTreeMap<&'static str, Job>,
}

#[derive(Serialize)]
struct Job {
    #[serde(rename = "runs-on")]
    runs_on: &'static str,
    steps: Vec<Step>,
}

#[derive(Default, Serialize)]
struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    with: Option<BTreeMap<&'static str, &'static str>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<&'static str>,
}

impl Step {
    fn uses(uses: &'static str) -> Self {
        Self {
            uses: Some(uses),
            ..Default::default()
        }
    }

    fn setup(
        name: &'static str,
        uses: &'static str,
        key: &'static str,
        version: &'static str,
    ) -> Self {
        Self {
            name: Some(name),
            uses: Some(uses),
            with: Some(BTreeMap::from([(key, version)])),
            ..Default::default()
        }
    }

    fn run(name: &'static str, run: &'static str) -> Self {
        Self {
            name: Some(name),
            run: Some(run),
            ..Default::default()
        }
    }
}

/// Available workflow templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowTemplate {
    Python,
    JavaScript,
}

impl WorkflowTemplate {
    /// Pick a template by its lowercase language key.
    ///
    /// Only `python` and `javascript` have dedicated templates, every other
    /// language receives the Python one.
    // TODO: decide with the product owner whether unsupported languages should get
    // a generic workflow instead of the Python template.
    pub fn for_language(language: &str) -> Self {
        if language.eq_ignore_ascii_case("javascript") {
            WorkflowTemplate::JavaScript
        } else {
            WorkflowTemplate::Python
        }
    }

    /// Build the workflow definition for this template.
    pub fn workflow(&self) -> Workflow {
        let (name, steps) = match self {
            WorkflowTemplate::Python => (
                "Python Code Analysis",
                vec![
                    Step::uses("actions/checkout@v2"),
                    Step::setup(
                        "Set up Python",
                        "actions/setup-python@v2",
                        "python-version",
                        "3.9",
                    ),
                    Step::run("Install dependencies", "pip install flake8 pylint mypy bandit"),
                    Step::run(
                        "Run flake8",
                        "flake8 . --count --select=E9,F63,F7,F82 --show-source --statistics",
                    ),
                    Step::run("Run pylint", "pylint $(find . -name \"*.py\") || true"),
                    Step::run("Run bandit", "bandit -r . || true"),
                ],
            ),
            WorkflowTemplate::JavaScript => (
                "JavaScript Code Analysis",
                vec![
                    Step::uses("actions/checkout@v2"),
                    Step::setup(
                        "Set up Node.js",
                        "actions/setup-node@v2",
                        "node-version",
                        "16",
                    ),
                    Step::run("Install ESLint", "npm install -g eslint"),
                    Step::run("Run ESLint", "eslint . --ext .js || true"),
                ],
            ),
        };

        Workflow {
            name,
            on: vec!["push"],
            jobs: BTreeMap::from([(
                "analyze",
                Job {
                    runs_on: "ubuntu-latest",
                    steps,
                },
            )]),
        }
    }

    /// Render the workflow document.
    ///
    /// The document is pretty-printed JSON, which GitHub Actions accepts as YAML.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.workflow())
    }
}
