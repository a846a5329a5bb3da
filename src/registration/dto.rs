use serde::{Deserialize, Serialize};

use crate::extract::{Problems, Validate};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub github_username: String,
    pub password: String,
    #[serde(default, rename = "confirmPassword", alias = "confirm_password")]
    pub confirm_password: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        p.name("name", &self.name);
        p.email("email", &self.email);
        p.github_username("github_username", &self.github_username);
        p.password("password", &self.password);
        p.into_vec()
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateGithubRequest {
    #[serde(default, rename = "githubUsername", alias = "github_username")]
    pub github_username: String,
}

impl Validate for ValidateGithubRequest {
    fn validate(&self) -> Vec<String> {
        let mut p = Problems::default();
        if self.github_username.trim().is_empty() {
            p.add("githubUsername", "GitHub username is required");
        } else {
            p.github_username("githubUsername", &self.github_username);
        }
        p.into_vec()
    }
}

#[derive(Debug, Serialize)]
pub struct GithubValidation {
    pub valid: bool,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}
