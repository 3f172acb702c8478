//! Page × action permission matrix.
//!
//! Every screen of the suite is a *page*; each page grants four independent
//! actions. The matrix keeps one invariant at every single toggle, not just on
//! save: any of `create`/`edit`/`delete` implies `view`, and revoking `view`
//! revokes the other three.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            other => Err(AppError::validation(format!("Unknown action '{other}'"))),
        }
    }
}

/// The four action bits of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actions {
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub delete: bool,
}

impl Actions {
    pub const NONE: Actions = Actions { view: false, create: false, edit: false, delete: false };
    pub const ALL: Actions = Actions { view: true, create: true, edit: true, delete: true };

    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }

    fn set(&mut self, action: Action, value: bool) {
        match action {
            Action::View => self.view = value,
            Action::Create => self.create = value,
            Action::Edit => self.edit = value,
            Action::Delete => self.delete = value,
        }
    }

    pub fn any(&self) -> bool {
        self.view || self.create || self.edit || self.delete
    }

    /// Repair a record that arrived without the cascade applied
    /// (e.g. from the wire): a write bit pulls `view` up with it.
    pub fn normalized(self) -> Self {
        Actions {
            view: self.view || self.create || self.edit || self.delete,
            ..self
        }
    }

    pub fn union(self, other: Actions) -> Self {
        Actions {
            view: self.view || other.view,
            create: self.create || other.create,
            edit: self.edit || other.edit,
            delete: self.delete || other.delete,
        }
    }
}

/// Apply one checkbox toggle and return the resulting record.
///
/// - enabling `create`, `edit` or `delete` forces `view` on;
/// - disabling `view` forces the other three off;
/// - enabling `view` leaves the other three untouched.
pub fn apply_cascade(current: Actions, changed: Action, value: bool) -> Actions {
    let mut next = current;
    next.set(changed, value);
    match (changed, value) {
        (Action::View, false) => Actions::NONE,
        (Action::View, true) => next,
        (_, true) => Actions { view: true, ..next },
        (_, false) => next,
    }
}

/// A page of the suite and its canonical route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub name: &'static str,
    pub url: &'static str,
}

pub const DASHBOARD: Page = Page { name: "Dashboard", url: "/dashboard" };
pub const CUSTOMERS: Page = Page { name: "Customers", url: "/customers" };
pub const PROPOSALS: Page = Page { name: "Proposals", url: "/proposals" };
pub const PROJECTS: Page = Page { name: "Projects", url: "/projects" };
pub const TASKS: Page = Page { name: "Tasks", url: "/tasks" };
pub const EMPLOYEES: Page = Page { name: "Employees", url: "/employees" };
pub const ROLES: Page = Page { name: "Roles", url: "/roles" };

/// Catalog order doubles as the landing-page preference order.
pub const PAGES: [Page; 7] = [DASHBOARD, CUSTOMERS, PROPOSALS, PROJECTS, TASKS, EMPLOYEES, ROLES];

/// Look up a catalog page by symbolic name or url.
pub fn find_page(key: &str) -> Option<&'static Page> {
    PAGES.iter().find(|p| p.name == key || p.url == key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePermission {
    pub page: String,
    pub url: String,
    #[serde(default)]
    pub actions: Actions,
}

impl PagePermission {
    pub fn new(page: impl Into<String>, url: impl Into<String>) -> Self {
        PagePermission {
            page: page.into(),
            url: url.into(),
            actions: Actions::NONE,
        }
    }

    pub fn for_page(page: &Page, actions: Actions) -> Self {
        PagePermission {
            page: page.name.to_string(),
            url: page.url.to_string(),
            actions,
        }
    }

    /// A lookup key matches either the symbolic page name or the url.
    pub fn matches(&self, key: &str) -> bool {
        self.page == key || self.url == key
    }

    pub fn toggle(&mut self, action: Action, value: bool) -> Actions {
        self.actions = apply_cascade(self.actions, action, value);
        self.actions
    }
}

/// Ordered list of page permissions with the cascade invariant held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
    entries: Vec<PagePermission>,
}

impl PermissionMatrix {
    /// Normalise each entry and merge repeated pages (by url) into the
    /// first occurrence, keeping the original order.
    pub fn new(entries: Vec<PagePermission>) -> Self {
        let mut merged: Vec<PagePermission> = Vec::with_capacity(entries.len());
        for mut entry in entries {
            entry.actions = entry.actions.normalized();
            match merged.iter_mut().find(|e| e.url == entry.url) {
                Some(existing) => existing.actions = existing.actions.union(entry.actions),
                None => merged.push(entry),
            }
        }
        PermissionMatrix { entries: merged }
    }

    /// Every catalog page, nothing granted. Starting point of the role editor.
    pub fn blank() -> Self {
        PermissionMatrix {
            entries: PAGES.iter().map(|p| PagePermission::for_page(p, Actions::NONE)).collect(),
        }
    }

    /// Every catalog page with every action.
    pub fn full() -> Self {
        PermissionMatrix {
            entries: PAGES.iter().map(|p| PagePermission::for_page(p, Actions::ALL)).collect(),
        }
    }

    pub fn entries(&self) -> &[PagePermission] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PagePermission> {
        self.entries
    }

    pub fn get(&self, key: &str) -> Option<&PagePermission> {
        self.entries.iter().find(|e| e.matches(key))
    }

    /// Missing pages resolve to all-false.
    pub fn actions_for(&self, key: &str) -> Actions {
        self.get(key).map(|e| e.actions).unwrap_or(Actions::NONE)
    }

    /// Toggle one action of one page with the cascade applied. A catalog page
    /// not yet in the matrix is added first.
    pub fn toggle(&mut self, key: &str, action: Action, value: bool) -> Result<Actions, AppError> {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.matches(key)) {
            return Ok(entry.toggle(action, value));
        }
        let page = find_page(key)
            .ok_or_else(|| AppError::validation(format!("Unknown page '{key}'")))?;
        let mut entry = PagePermission::for_page(page, Actions::NONE);
        let actions = entry.toggle(action, value);
        self.entries.push(entry);
        Ok(actions)
    }

    pub fn has_any_action(&self) -> bool {
        self.entries.iter().any(|e| e.actions.any())
    }
}
