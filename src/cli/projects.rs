//! `loom projects`

use crate::api::ApiClient;
use crate::controllers::ProjectController;
use crate::core::models::ProjectSummary;
use crate::error::Result;

/// Print every project on the server
pub async fn handle_projects(client: &ApiClient) -> Result<()> {
    let projects = ProjectController::new(client).list().await?;
    if projects.is_empty() {
        println!("No projects yet. Create one in the TUI by running 'loom'.");
        return Ok(());
    }
    for line in format_projects(&projects) {
        println!("{}", line);
    }
    Ok(())
}

fn format_projects(projects: &[ProjectSummary]) -> Vec<String> {
    let width = projects.iter().map(|p| p.id.len()).max().unwrap_or(0);
    projects
        .iter()
        .map(|p| {
            let lock = if p.is_password_protected { " (locked)" } else { "" };
            format!("{:width$}  {}{}", p.id, p.name, lock, width = width)
        })
        .collect()
}
