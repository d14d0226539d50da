//! Client-side copy of server state
//!
//! Only the UI loop writes here. Every mutation publishes a [`StateChange`]
//! on the owned emitter so views can re-render the affected tab.

use crate::core::emitter::EventEmitter;
use crate::core::models::{ManuscriptBlock, Project, ProjectBundle, ProjectSummary, Scenario};
use crate::error::Result;

/// Event name every state mutation is published under
pub const STATE_CHANGED: &str = "state:changed";

/// What part of the state changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Projects,
    Project,
    Scenarios,
    Manuscript,
    Cleared,
}

/// Last snapshot the server sent
#[derive(Default)]
pub struct ProjectState {
    projects: Vec<ProjectSummary>,
    current: Option<Project>,
    scenarios: Vec<Scenario>,
    manuscript: Vec<ManuscriptBlock>,
    events: EventEmitter<StateChange>,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &EventEmitter<StateChange> {
        &self.events
    }

    pub fn projects(&self) -> &[ProjectSummary] {
        &self.projects
    }

    pub fn current(&self) -> Option<&Project> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.id.as_str())
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// The project's scenario; the backend keeps exactly one per project
    pub fn scenario(&self) -> Option<&Scenario> {
        self.scenarios.first()
    }

    pub fn manuscript(&self) -> &[ManuscriptBlock] {
        &self.manuscript
    }

    pub fn set_projects(&mut self, projects: Vec<ProjectSummary>) -> Result<()> {
        self.projects = projects;
        self.events.emit(STATE_CHANGED, &StateChange::Projects)
    }

    pub fn set_project(&mut self, project: Project) -> Result<()> {
        self.current = Some(project);
        self.events.emit(STATE_CHANGED, &StateChange::Project)
    }

    pub fn set_scenarios(&mut self, scenarios: Vec<Scenario>) -> Result<()> {
        self.scenarios = scenarios;
        self.events.emit(STATE_CHANGED, &StateChange::Scenarios)
    }

    pub fn set_manuscript(&mut self, blocks: Vec<ManuscriptBlock>) -> Result<()> {
        let mut blocks = blocks;
        blocks.sort_by_key(|b| b.ordering);
        self.manuscript = blocks;
        self.events.emit(STATE_CHANGED, &StateChange::Manuscript)
    }

    /// Replace everything shown for the open project
    pub fn apply_bundle(&mut self, bundle: ProjectBundle) -> Result<()> {
        self.set_project(bundle.project)?;
        self.set_scenarios(bundle.scenarios)?;
        self.set_manuscript(bundle.manuscript)
    }

    /// Drop the open project (back to the project list)
    pub fn clear_project(&mut self) -> Result<()> {
        self.current = None;
        self.scenarios.clear();
        self.manuscript.clear();
        self.events.emit(STATE_CHANGED, &StateChange::Cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::emitter::Listener;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn block(id: &str, ordering: i64) -> ManuscriptBlock {
        ManuscriptBlock {
            id: id.into(),
            title: id.into(),
            ordering,
            ..Default::default()
        }
    }

    #[test]
    fn test_every_mutation_is_published() {
        let mut state = ProjectState::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let listener: Listener<StateChange> = Rc::new(move |change| {
            sink.borrow_mut().push(*change);
            Ok(())
        });
        state.events().on(STATE_CHANGED, listener);

        state.set_projects(Vec::new()).unwrap();
        state
            .apply_bundle(ProjectBundle {
                project: Project {
                    id: "p1".into(),
                    name: "Saga".into(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .unwrap();
        state.clear_project().unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                StateChange::Projects,
                StateChange::Project,
                StateChange::Scenarios,
                StateChange::Manuscript,
                StateChange::Cleared,
            ]
        );
        assert!(state.current().is_none());
    }

    #[test]
    fn test_manuscript_sorted_by_ordering() {
        let mut state = ProjectState::new();
        state
            .set_manuscript(vec![block("b", 2), block("a", 0), block("c", 1)])
            .unwrap();
        let ids: Vec<&str> = state.manuscript().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }
}
