//! Request validation, run before any domain logic.
//!
//! Each check names the offending field so the error response can point the
//! client at it.

use crate::{
    error::{AppError, AppResult},
    models::{
        post::{ListQuery, PostDraft, PostFilter, PostPayload, DEFAULT_LIMIT, DEFAULT_OFFSET},
        user::{CreateUser, LoginForm},
        vote::{VoteDirection, VotePayload},
    },
};

pub fn required<T>(field: &'static str, value: Option<T>) -> AppResult<T> {
    value.ok_or_else(|| AppError::validation(field, format!("missing required field: {field}")))
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let invalid = || AppError::validation("email", "email must be a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) if !name.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::validation("password", "password must not be empty"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation("title", "title must not be empty"));
    }
    Ok(())
}

pub fn validate_pagination(limit: i64, offset: i64) -> AppResult<()> {
    if limit < 0 {
        return Err(AppError::validation("limit", "limit must not be negative"));
    }
    if offset < 0 {
        return Err(AppError::validation("offset", "offset must not be negative"));
    }
    Ok(())
}

impl TryFrom<i64> for VoteDirection {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteDirection::Remove),
            1 => Ok(VoteDirection::Add),
            _ => Err(AppError::validation("direction", "direction must be 0 or 1")),
        }
    }
}

/// Validated registration input.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
}

impl TryFrom<CreateUser> for NewUser {
    type Error = AppError;

    fn try_from(payload: CreateUser) -> Result<Self, Self::Error> {
        let email = required("email", payload.email)?;
        let password = required("password", payload.password)?;
        validate_email(&email)?;
        validate_password(&password)?;

        Ok(NewUser {
            email,
            password,
            phone_number: payload.phone_number,
        })
    }
}

pub fn login_credentials(form: LoginForm) -> AppResult<(String, String)> {
    let username = required("username", form.username)?;
    let password = required("password", form.password)?;
    Ok((username, password))
}

impl TryFrom<PostPayload> for PostDraft {
    type Error = AppError;

    fn try_from(payload: PostPayload) -> Result<Self, Self::Error> {
        let title = required("title", payload.title)?;
        validate_title(&title)?;

        Ok(PostDraft {
            title,
            content: payload.content,
            published: payload.published.unwrap_or(true),
        })
    }
}

impl TryFrom<ListQuery> for PostFilter {
    type Error = AppError;

    fn try_from(query: ListQuery) -> Result<Self, Self::Error> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        let offset = query.offset.unwrap_or(DEFAULT_OFFSET);
        validate_pagination(limit, offset)?;

        Ok(PostFilter {
            search: query.search.unwrap_or_default(),
            limit,
            offset,
        })
    }
}

pub fn vote_request(payload: VotePayload) -> AppResult<(i64, VoteDirection)> {
    let post_id = required("postId", payload.post_id)?;
    let direction = required("direction", payload.direction)?;
    Ok((post_id, VoteDirection::try_from(direction)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn field_of(error: AppError) -> &'static str {
        match error {
            AppError::Validation { field, .. } => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[rstest]
    #[case("a@x.com")]
    #[case("first.last@sub.example.org")]
    fn accepts_well_formed_email(#[case] email: &str) {
        assert!(validate_email(email).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("plainaddress")]
    #[case("@x.com")]
    #[case("a@x")]
    #[case("a@.com")]
    #[case("a@x.")]
    #[case("a@b@x.com")]
    #[case("a b@x.com")]
    fn rejects_malformed_email(#[case] email: &str) {
        assert_eq!(field_of(validate_email(email).unwrap_err()), "email");
    }

    #[rstest]
    #[case(0, VoteDirection::Remove)]
    #[case(1, VoteDirection::Add)]
    fn direction_accepts_zero_and_one(#[case] raw: i64, #[case] expected: VoteDirection) {
        assert_eq!(VoteDirection::try_from(raw).unwrap(), expected);
    }

    #[rstest]
    #[case(-1)]
    #[case(2)]
    #[case(100)]
    fn direction_rejects_everything_else(#[case] raw: i64) {
        assert_eq!(field_of(VoteDirection::try_from(raw).unwrap_err()), "direction");
    }

    #[rstest]
    #[case(-1, 0, "limit")]
    #[case(10, -5, "offset")]
    fn negative_pagination_is_rejected(#[case] limit: i64, #[case] offset: i64, #[case] field: &str) {
        assert_eq!(field_of(validate_pagination(limit, offset).unwrap_err()), field);
    }

    #[test]
    fn list_query_defaults() {
        let filter = PostFilter::try_from(ListQuery::default()).unwrap();
        assert_eq!(filter, PostFilter::default());
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 0);
        assert_eq!(filter.search, "");
    }

    #[test]
    fn post_payload_requires_a_title_and_defaults_published() {
        let missing = PostPayload {
            title: None,
            content: Some("body".into()),
            published: None,
        };
        assert_eq!(field_of(PostDraft::try_from(missing).unwrap_err()), "title");

        let blank = PostPayload {
            title: Some("   ".into()),
            content: None,
            published: None,
        };
        assert_eq!(field_of(PostDraft::try_from(blank).unwrap_err()), "title");

        let draft = PostDraft::try_from(PostPayload {
            title: Some("hello".into()),
            content: None,
            published: None,
        })
        .unwrap();
        assert!(draft.published);
        assert_eq!(draft.content, None);
    }

    #[test]
    fn registration_reports_the_missing_field() {
        let payload = CreateUser {
            email: Some("a@x.com".into()),
            password: None,
            phone_number: None,
        };
        assert_eq!(field_of(NewUser::try_from(payload).unwrap_err()), "password");
    }

    #[test]
    fn vote_request_requires_both_fields() {
        let payload = VotePayload {
            post_id: None,
            direction: Some(1),
        };
        assert_eq!(field_of(vote_request(payload).unwrap_err()), "postId");

        let payload = VotePayload {
            post_id: Some(3),
            direction: Some(1),
        };
        assert_eq!(vote_request(payload).unwrap(), (3, VoteDirection::Add));
    }
}
