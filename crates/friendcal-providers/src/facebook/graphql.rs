//! Monthly birthdays GraphQL query.
//!
//! Each request covers the offset month and the two months after it. The
//! response nests friends as
//! `data.viewer.all_friends_by_birthday_month.edges[].node.friends.edges[].node`.

use friendcal_core::{CoreError, Person};
use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};
use crate::facebook::extract::strip_guard_prefix;

pub const FRIENDLY_NAME: &str = "BirthdayCometMonthlyBirthdaysRefetchQuery";

pub const DOC_ID: &str = "5347559575302259";

/// Month offsets that together cover a full year.
///
/// Each window spans three months. Upstream answers offsets 6 and 7 with the
/// same data, so the last window is 10 rather than 9.
pub const WINDOW_OFFSETS: [u32; 5] = [0, 3, 6, 9, 10];

/// Form fields for one window.
pub fn request_form(offset_month: u32, token: &str) -> Vec<(String, String)> {
    let variables = serde_json::json!({ "offset_month": offset_month, "scale": 1.5 });
    vec![
        ("fb_api_req_friendly_name".to_string(), FRIENDLY_NAME.to_string()),
        ("variables".to_string(), variables.to_string()),
        ("doc_id".to_string(), DOC_ID.to_string()),
        ("fb_dtsg".to_string(), token.to_string()),
        ("__a".to_string(), "1".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct Response {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    all_friends_by_birthday_month: Connection<MonthNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct MonthNode {
    friends: Connection<FriendNode>,
}

#[derive(Debug, Deserialize)]
struct FriendNode {
    id: String,
    name: String,
    profile_url: Option<String>,
    profile_picture: Option<Picture>,
    birthdate: Birthdate,
}

#[derive(Debug, Deserialize)]
struct Picture {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Birthdate {
    day: u32,
    month: u32,
    year: Option<i32>,
}

/// Turns one window's response body into persons.
///
/// # Errors
///
/// Returns an invalid-response error when the body does not have the
/// expected shape or carries an impossible date.
pub fn parse_window(body: &str) -> ProviderResult<Vec<Person>> {
    let response: Response = serde_json::from_str(strip_guard_prefix(body)).map_err(|e| {
        tracing::debug!(body, "unexpected GraphQL response");
        ProviderError::invalid_response(format!("{FRIENDLY_NAME} response: {e}")).with_source(e)
    })?;

    response
        .data
        .viewer
        .all_friends_by_birthday_month
        .edges
        .into_iter()
        .flat_map(|month| month.node.friends.edges)
        .map(|edge| into_person(edge.node))
        .collect()
}

fn into_person(friend: FriendNode) -> ProviderResult<Person> {
    let FriendNode {
        id,
        name,
        profile_url,
        profile_picture,
        birthdate,
    } = friend;

    let invalid = |e: CoreError| ProviderError::invalid_response(e.to_string()).with_source(e);
    let mut person = Person::new(id, name, birthdate.day, birthdate.month)
        .map_err(invalid)?
        .with_year(birthdate.year);
    if let Some(year) = birthdate.year {
        person.birth_date().in_year(year).map_err(invalid)?;
    }
    if let Some(url) = profile_url {
        person = person.with_profile_url(url);
    }
    if let Some(uri) = profile_picture.and_then(|p| p.uri) {
        person = person.with_profile_picture(uri);
    }
    Ok(person)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn friend(id: &str, name: &str, day: u32, month: u32, year: Option<i32>) -> Value {
        json!({
            "id": id,
            "name": name,
            "profile_url": format!("https://www.facebook.com/{}", name.to_lowercase().replace(' ', ".")),
            "profile_picture": { "uri": format!("https://scontent.example/{id}.jpg") },
            "birthdate": { "day": day, "month": month, "year": year },
        })
    }

    /// A window response with one month node per inner vector.
    pub fn window(months: Vec<Vec<Value>>) -> String {
        let edges: Vec<Value> = months
            .into_iter()
            .map(|friends| {
                let friend_edges: Vec<Value> =
                    friends.into_iter().map(|f| json!({ "node": f })).collect();
                json!({ "node": { "friends": { "edges": friend_edges } } })
            })
            .collect();
        json!({ "data": { "viewer": { "all_friends_by_birthday_month": { "edges": edges } } } })
            .to_string()
    }
}
