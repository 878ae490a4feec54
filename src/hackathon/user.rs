//! The `user` object type
//!
//! One document per participant. Applicants edit their application until
//! `application_close`, submit it, and once accepted confirm attendance
//! before `confirmation_close` while seats remain. Organizers manage status;
//! volunteers may read participants and check them in.

use serde_json::{json, Value};

use crate::schema::rules::{
    admin_only, all_of, any_of, before_deadline, is_bool, is_owner, is_true, matches_pattern, max_length, non_empty,
    one_of, owner_or_privileged, privileged, target_flag, target_flag_unset,
};
use crate::schema::{CheckContext, GroupSpec, Interceptor, LeafSpec, Node, Predicate};

pub const OBJECT_TYPE: &str = "user";

/// Deadline after which applications are frozen
pub const APPLICATION_CLOSE: &str = "application_close";

/// Deadline after which accepted applicants can no longer confirm
pub const CONFIRMATION_CLOSE: &str = "confirmation_close";

/// Capacity limit and its counter for confirmed participants
pub const MAX_CONFIRMED: &str = "max_confirmed";
pub const CONFIRMED: &str = "confirmed";

pub const MAX_TEAM_SIZE: usize = 4;
pub const SHIRT_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];
pub const REDACTED: &str = "[redacted]";

/// Application answers that must be non-empty before submission
pub const REQUIRED_ANSWERS: [&str; 4] = ["first_name", "last_name", "school", "essay"];

fn volunteer() -> Predicate {
    Predicate::when(|ctx| ctx.request_user.is_volunteer())
}

/// Bounded free text; required on submission
fn text_leaf(max: usize, caption: &str) -> Node {
    Node::leaf()
        .read(true)
        .write(max_length(max))
        .submit(all_of(vec![non_empty(), max_length(max)]))
        .caption(caption)
        .into()
}

fn flag_leaf(caption: &str) -> Node {
    Node::leaf().read(true).write(is_bool()).caption(caption).into()
}

/// Submitted or stored application value at `application.<key>`
fn application_value<'a>(ctx: &CheckContext<'a>, key: &str) -> Option<&'a Value> {
    let path = format!("application.{}", key);
    ctx.submission_at(&path).or_else(|| ctx.target_at(&path))
}

/// Every required answer is filled in and the terms are accepted,
/// counting both this submission and what is already stored
fn application_complete() -> Predicate {
    Predicate::when(|ctx| {
        let answered = REQUIRED_ANSWERS.iter().all(|key| {
            application_value(ctx, key)
                .and_then(Value::as_str)
                .is_some_and(|text| !text.trim().is_empty())
        });
        answered && application_value(ctx, "accepted_terms") == Some(&Value::Bool(true))
    })
}

/// Seats remain, or this participant already holds one
fn seat_available() -> Predicate {
    Predicate::when(|ctx| {
        ctx.target_at("status.confirmed") == Some(&Value::Bool(true))
            || ctx.universe_state.has_capacity(MAX_CONFIRMED, CONFIRMED)
    })
}

/// Array of at most `MAX_TEAM_SIZE` strings
fn team_list() -> Predicate {
    Predicate::when(|ctx| match ctx.field_value {
        Some(Value::Array(items)) => items.len() <= MAX_TEAM_SIZE && items.iter().all(Value::is_string),
        _ => false,
    })
}

/// Participant-facing names of teammates.
///
/// The routing layer may join real names in before projection; otherwise
/// the stored member ids are shown.
fn teammate_names() -> Interceptor {
    Interceptor::new(|joined, ctx| match joined {
        Some(names @ Value::Array(_)) => names.clone(),
        _ => ctx
            .target_at("team_members")
            .filter(|members| members.is_array())
            .cloned()
            .unwrap_or_else(|| json!([])),
    })
}

/// Admins see the raw token; everyone else sees a sentinel
fn qr_token() -> Interceptor {
    Interceptor::new(|value, ctx| match value {
        Some(Value::Null) | None => Value::Null,
        Some(raw) if ctx.request_user.is_admin() => raw.clone(),
        Some(_) => Value::String(REDACTED.to_string()),
    })
}

fn roles() -> GroupSpec {
    Node::group()
        .read(true)
        .write(admin_only())
        .caption("Roles")
        .field("admin", flag_leaf("Admin"))
        .field("organizer", flag_leaf("Organizer"))
        .field("volunteer", flag_leaf("Volunteer"))
        .field("hacker", flag_leaf("Hacker"))
}

fn status() -> GroupSpec {
    let organizer_flag = |caption: &str| -> LeafSpec {
        Node::leaf()
            .read(true)
            .write(all_of(vec![privileged(), is_bool()]))
            .caption(caption)
    };

    Node::group()
        .read(true)
        .write(any_of(vec![privileged(), volunteer()]))
        .submit(any_of(vec![privileged(), volunteer(), is_owner()]))
        .caption("Status")
        .field(
            "applied",
            // Owners flip this themselves when submitting a complete application.
            organizer_flag("Applied").submit(any_of(vec![
                all_of(vec![privileged(), is_bool()]),
                all_of(vec![is_owner(), is_true(), application_complete()]),
            ])),
        )
        .field(
            "accepted",
            Node::leaf()
                .read(any_of(vec![privileged(), target_flag("status.released")]))
                .write(all_of(vec![privileged(), is_bool()]))
                .caption("Accepted"),
        )
        .field(
            "released",
            Node::leaf()
                .read(privileged())
                .write(all_of(vec![privileged(), is_bool()]))
                .caption("Decision released"),
        )
        .field("confirmed", organizer_flag("Confirmed"))
        .field(
            "checked_in",
            Node::leaf()
                .read(true)
                .write(all_of(vec![any_of(vec![privileged(), volunteer()]), is_bool()]))
                .caption("Checked in"),
        )
}

fn application() -> GroupSpec {
    Node::group()
        .read(true)
        .write(any_of(vec![
            privileged(),
            all_of(vec![
                is_owner(),
                before_deadline(APPLICATION_CLOSE),
                target_flag_unset("status.applied"),
            ]),
        ]))
        .submit(all_of(vec![
            is_owner(),
            before_deadline(APPLICATION_CLOSE),
            target_flag_unset("status.applied"),
        ]))
        .caption("Application")
        .field("first_name", text_leaf(100, "First name"))
        .field("last_name", text_leaf(100, "Last name"))
        .field("school", text_leaf(200, "School"))
        .field("essay", text_leaf(2000, "Why do you want to attend?"))
        .field(
            "github",
            Node::leaf()
                .read(true)
                .write(matches_pattern(r"^[A-Za-z0-9-]{0,39}$"))
                .caption("GitHub username"),
        )
        .field(
            "accepted_terms",
            Node::leaf()
                .read(true)
                .write(is_bool())
                .submit(is_true())
                .caption("Terms and conditions"),
        )
}

fn confirmation() -> GroupSpec {
    Node::group()
        .read(any_of(vec![privileged(), target_flag("status.released")]))
        .write(all_of(vec![
            owner_or_privileged(),
            target_flag("status.accepted"),
            before_deadline(CONFIRMATION_CLOSE),
            seat_available(),
        ]))
        .caption("Confirmation")
        .field(
            "shirt_size",
            Node::leaf()
                .read(true)
                .write(one_of(SHIRT_SIZES.iter().map(|size| json!(size)).collect()))
                .caption("Shirt size"),
        )
        .field(
            "dietary_restrictions",
            Node::leaf().read(true).write(max_length(500)).caption("Dietary restrictions"),
        )
        .field("attending", flag_leaf("Attending"))
}

/// Root group of the `user` object type
pub fn schema() -> GroupSpec {
    Node::group()
        .create(privileged())
        .read(any_of(vec![owner_or_privileged(), volunteer()]))
        .write(any_of(vec![owner_or_privileged(), volunteer()]))
        .delete(admin_only())
        .caption("User")
        .field("_id", Node::leaf().read(true).caption("Id"))
        .field(
            "email",
            Node::leaf()
                .read(true)
                .write(all_of(vec![privileged(), non_empty(), max_length(254)]))
                .caption("Email"),
        )
        .field("roles", roles())
        .field("status", status())
        .field("application", application())
        .field("confirmation", confirmation())
        .field(
            "qr_token",
            Node::leaf().read(owner_or_privileged()).intercept(qr_token()).caption("QR token"),
        )
        .field(
            "team_members",
            Node::leaf()
                .read(true)
                .write(all_of(vec![owner_or_privileged(), team_list()]))
                .caption("Team members"),
        )
        .field(
            "teammate_names",
            Node::leaf()
                .read(true)
                .virtual_field()
                .intercept(teammate_names())
                .caption("Teammates"),
        )
}
