//! Threaded comments management.
//!
//! Provides functions for adding, querying, resolving, and removing
//! threaded comments (Excel 2019+ feature). Threaded comments support
//! replies and resolved state, unlike legacy comments.

use sheetkit_xml::threaded_comment::{Person, PersonList, ThreadedComment, ThreadedComments};

use crate::error::{Error, Result};

/// Input configuration for adding a threaded comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadedCommentInput {
    /// Display name of the comment author.
    pub author: String,
    /// The comment text.
    pub text: String,
    /// Optional parent comment ID for replies.
    pub parent_id: Option<String>,
}

/// Input configuration for adding a person.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonInput {
    /// Display name of the person.
    pub display_name: String,
    /// Optional user ID (e.g. email address).
    pub user_id: Option<String>,
    /// Optional provider ID (e.g. "ADAL").
    pub provider_id: Option<String>,
}

/// Output data for a threaded comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadedCommentData {
    /// Unique comment ID (GUID).
    pub id: String,
    /// Cell reference (e.g. "A1").
    pub cell_ref: String,
    /// Comment text.
    pub text: String,
    /// Author display name.
    pub author: String,
    /// Person ID (GUID).
    pub person_id: String,
    /// ISO 8601 timestamp.
    pub date_time: String,
    /// Parent comment ID (for replies).
    pub parent_id: Option<String>,
    /// Whether the comment thread is marked as resolved.
    pub done: bool,
}

/// Output data for a person.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonData {
    /// Person ID (GUID).
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Optional user ID.
    pub user_id: Option<String>,
    /// Optional provider ID.
    pub provider_id: Option<String>,
}

/// Generate a random UUID v4 wrapped in curly braces.
fn generate_guid() -> String {
    format!("{{{}}}", uuid::Uuid::new_v4().to_string().to_uppercase())
}

/// Get the current UTC timestamp in ISO 8601 format with two-digit
/// fractional seconds, matching the format Excel uses for threaded comments.
fn current_timestamp() -> String {
    let now = chrono::Utc::now();
    let base = now.format("%Y-%m-%dT%H:%M:%S").to_string();
    let centiseconds = now.timestamp_subsec_millis() / 10;
    format!("{base}.{centiseconds:02}")
}

/// Generate a GUID that does not collide with any existing person or comment ID.
fn generate_unique_guid(
    person_list: &PersonList,
    threaded_comments: Option<&ThreadedComments>,
) -> String {
    loop {
        let id = generate_guid();
        let person_collision = person_list.persons.iter().any(|p| p.id == id);
        let comment_collision = threaded_comments
            .map(|tc| tc.comments.iter().any(|c| c.id == id))
            .unwrap_or(false);
        if !person_collision && !comment_collision {
            return id;
        }
    }
}

/// Find or create a person in the person list, returning their ID.
pub fn find_or_create_person(
    person_list: &mut PersonList,
    display_name: &str,
    user_id: Option<&str>,
    provider_id: Option<&str>,
) -> String {
    find_or_create_person_with_collision_check(
        person_list,
        display_name,
        user_id,
        provider_id,
        None,
    )
}

/// Find or create a person with collision checking against existing IDs.
fn find_or_create_person_with_collision_check(
    person_list: &mut PersonList,
    display_name: &str,
    user_id: Option<&str>,
    provider_id: Option<&str>,
    threaded_comments: Option<&ThreadedComments>,
) -> String {
    if let Some(existing) = person_list
        .persons
        .iter()
        .find(|p| p.display_name == display_name)
    {
        return existing.id.clone();
    }

    let id = generate_unique_guid(person_list, threaded_comments);
    person_list.persons.push(Person {
        display_name: display_name.to_string(),
        id: id.clone(),
        user_id: user_id.map(|s| s.to_string()),
        provider_id: provider_id.map(|s| s.to_string()),
    });
    id
}

/// Add a threaded comment to a sheet's threaded comments collection.
///
/// Validates the cell reference format before inserting. Returns the
/// generated comment ID.
pub fn add_threaded_comment(
    threaded_comments: &mut Option<ThreadedComments>,
    person_list: &mut PersonList,
    cell: &str,
    input: &ThreadedCommentInput,
) -> Result<String> {
    crate::utils::cell_ref::cell_name_to_coordinates(cell)?;

    if let Some(ref parent_id) = input.parent_id {
        let tc = threaded_comments.as_ref();
        let parent_exists = tc
            .map(|t| t.comments.iter().any(|c| c.id == *parent_id))
            .unwrap_or(false);
        if !parent_exists {
            return Err(Error::ThreadedCommentNotFound {
                id: parent_id.clone(),
            });
        }
    }

    let person_id = find_or_create_person_with_collision_check(
        person_list,
        &input.author,
        None,
        None,
        threaded_comments.as_ref(),
    );
    let comment_id = generate_unique_guid(person_list, threaded_comments.as_ref());

    let tc = threaded_comments.get_or_insert_with(ThreadedComments::default);
    tc.comments.push(ThreadedComment {
        cell_ref: cell.to_string(),
        date_time: current_timestamp(),
        person_id,
        id: comment_id.clone(),
        parent_id: input.parent_id.clone(),
        done: None,
        text: input.text.clone(),
    });

    Ok(comment_id)
}

/// Get all threaded comments for a sheet.
pub fn get_threaded_comments(
    threaded_comments: &Option<ThreadedComments>,
    person_list: &PersonList,
) -> Vec<ThreadedCommentData> {
    let Some(tc) = threaded_comments.as_ref() else {
        return Vec::new();
    };

    tc.comments
        .iter()
        .map(|c| {
            let author = person_list
                .persons
                .iter()
                .find(|p| p.id == c.person_id)
                .map(|p| p.display_name.clone())
                .unwrap_or_default();
            ThreadedCommentData {
                id: c.id.clone(),
                cell_ref: c.cell_ref.clone(),
                text: c.text.clone(),
                author,
                person_id: c.person_id.clone(),
                date_time: c.date_time.clone(),
                parent_id: c.parent_id.clone(),
                done: c.done.as_deref() == Some("1"),
            }
        })
        .collect()
}

/// Get threaded comments for a specific cell.
pub fn get_threaded_comments_by_cell(
    threaded_comments: &Option<ThreadedComments>,
    person_list: &PersonList,
    cell: &str,
) -> Vec<ThreadedCommentData> {
    get_threaded_comments(threaded_comments, person_list)
        .into_iter()
        .filter(|c| c.cell_ref == cell)
        .collect()
}

/// Delete a threaded comment by its ID.
///
/// Returns an error if the comment was not found.
pub fn delete_threaded_comment(
    threaded_comments: &mut Option<ThreadedComments>,
    comment_id: &str,
) -> Result<()> {
    if let Some(ref mut tc) = threaded_comments {
        let before = tc.comments.len();
        tc.comments.retain(|c| c.id != comment_id);
        if tc.comments.len() == before {
            return Err(Error::ThreadedCommentNotFound {
                id: comment_id.to_string(),
            });
        }

        if tc.comments.is_empty() {
            *threaded_comments = None;
        }

        Ok(())
    } else {
        Err(Error::ThreadedCommentNotFound {
            id: comment_id.to_string(),
        })
    }
}

/// Set the resolved (done) state of a threaded comment.
///
/// Returns an error if the comment was not found.
pub fn resolve_threaded_comment(
    threaded_comments: &mut Option<ThreadedComments>,
    comment_id: &str,
    done: bool,
) -> Result<()> {
    if let Some(ref mut tc) = threaded_comments {
        if let Some(comment) = tc.comments.iter_mut().find(|c| c.id == comment_id) {
            comment.done = if done { Some("1".to_string()) } else { None };
            return Ok(());
        }
    }
    Err(Error::ThreadedCommentNotFound {
        id: comment_id.to_string(),
    })
}

/// Add a person to the person list. Returns the person ID.
pub fn add_person(person_list: &mut PersonList, input: &PersonInput) -> String {
    find_or_create_person(
        person_list,
        &input.display_name,
        input.user_id.as_deref(),
        input.provider_id.as_deref(),
    )
}

/// Get all persons from the person list.
pub fn get_persons(person_list: &PersonList) -> Vec<PersonData> {
    person_list
        .persons
        .iter()
        .map(|p| PersonData {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            user_id: p.user_id.clone(),
            provider_id: p.provider_id.clone(),
        })
        .collect()
}
