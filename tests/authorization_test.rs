use homedesk::auth::evaluator::{User, accessible_routes, actions_for, default_route, has_permission};
use homedesk::auth::permission::{
    Action, Actions, PagePermission, PermissionMatrix, CUSTOMERS, PAGES, PROPOSALS, TASKS, apply_cascade,
};
use homedesk::models::role::Role;

fn user_with(permissions: Vec<PagePermission>) -> User {
    let role = Role { id: 1, name: "Custom".to_string(), permissions };
    User::with_role(5, "pat", Some(&role))
}

// ============================================================================
// EVALUATOR
// ============================================================================

#[test]
fn test_view_without_edit_denies_edit() {
    let user = user_with(vec![PagePermission::for_page(
        &PROPOSALS,
        Actions { view: true, edit: false, ..Actions::NONE },
    )]);
    assert!(!has_permission(&user, "Proposals", Action::Edit));
    assert!(has_permission(&user, "Proposals", Action::View));
    // url lookups resolve to the same entry
    assert!(has_permission(&user, "/proposals", Action::View));
}

#[test]
fn test_pages_missing_from_the_role_fail_closed() {
    let user = user_with(vec![PagePermission::for_page(&PROPOSALS, Actions::ALL)]);
    for page in ["Tasks", "Reports", ""] {
        assert_eq!(actions_for(&user, page), Actions::NONE);
        for action in Action::ALL {
            assert!(!has_permission(&user, page, action));
        }
    }
}

#[test]
fn test_admin_is_allowed_everything() {
    let admin = User::admin(1, "root");
    for page in PAGES {
        for action in Action::ALL {
            assert!(has_permission(&admin, page.name, action));
        }
    }
    assert!(has_permission(&admin, "Reports", Action::Delete));
    assert_eq!(default_route(&admin).as_deref(), Some("/dashboard"));
}

#[test]
fn test_routes_follow_role_order() {
    let user = user_with(vec![
        PagePermission::for_page(&TASKS, Actions { view: true, ..Actions::NONE }),
        PagePermission::for_page(&CUSTOMERS, Actions::NONE),
        PagePermission::for_page(&PROPOSALS, Actions::ALL),
    ]);
    assert_eq!(accessible_routes(&user), vec!["/tasks".to_string(), "/proposals".to_string()]);
    assert_eq!(default_route(&user).as_deref(), Some("/tasks"));
}

#[test]
fn test_stored_permissions_violating_the_cascade_are_normalised() {
    // edit without view can only come from a hand-edited record
    let user = user_with(vec![PagePermission::for_page(
        &PROPOSALS,
        Actions { edit: true, ..Actions::NONE },
    )]);
    assert!(has_permission(&user, "Proposals", Action::View));
    assert_eq!(accessible_routes(&user), vec!["/proposals".to_string()]);
}

// ============================================================================
// CASCADE
// ============================================================================

#[test]
fn test_enabling_edit_enables_view() {
    let next = apply_cascade(Actions::NONE, Action::Edit, true);
    assert_eq!(next, Actions { view: true, edit: true, ..Actions::NONE });
}

#[test]
fn test_disabling_view_clears_everything() {
    assert_eq!(apply_cascade(Actions::ALL, Action::View, false), Actions::NONE);
}

#[test]
fn test_cascade_holds_after_every_toggle() {
    let mut matrix = PermissionMatrix::blank();
    let steps = [
        ("Proposals", Action::Delete, true),
        ("Proposals", Action::View, false),
        ("Tasks", Action::Create, true),
        ("Tasks", Action::Create, false),
        ("Roles", Action::Edit, true),
        ("Proposals", Action::View, true),
        ("Roles", Action::View, false),
    ];
    for (page, action, value) in steps {
        matrix.toggle(page, action, value).unwrap();
        for entry in matrix.entries() {
            let a = entry.actions;
            if a.create || a.edit || a.delete {
                assert!(a.view, "{} broke the cascade", entry.page);
            }
        }
    }
    assert_eq!(matrix.actions_for("Tasks"), Actions { view: true, ..Actions::NONE });
    assert_eq!(matrix.actions_for("Roles"), Actions::NONE);
}

#[test]
fn test_unknown_page_toggle_is_rejected() {
    let mut matrix = PermissionMatrix::default();
    assert!(matrix.toggle("Invoices", Action::View, true).is_err());
    assert!(matrix.toggle("/tasks", Action::View, true).is_ok());
    assert_eq!(matrix.entries().len(), 1);
}
