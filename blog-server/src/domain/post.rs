use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{DomainError, FieldViolation};

const TITLE_MIN_CHARS: usize = 5;
const TITLE_MAX_CHARS: usize = 120;
const CONTENT_MIN_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) image_url: Option<String>,
    pub(crate) content: String,
    /// Author name copied at creation time. Never re-synced with the user record.
    pub(crate) username: String,
    pub(crate) user_id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Field values that passed every post rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostFields {
    pub(crate) title: String,
    pub(crate) image_url: Option<String>,
    pub(crate) content: String,
}

impl PostFields {
    pub(crate) fn validate(
        title: &str,
        image_url: Option<&str>,
        content: &str,
    ) -> Result<Self, DomainError> {
        let title = normalize_title(title);
        let image_url = normalize_image_url(image_url);
        let content = normalize_content(content);

        match (title, image_url, content) {
            (Ok(title), Ok(image_url), Ok(content)) => Ok(Self {
                title,
                image_url,
                content,
            }),
            (title, image_url, content) => Err(DomainError::Validation(
                [title.err(), image_url.err(), content.err()]
                    .into_iter()
                    .flatten()
                    .collect(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) image_url: Option<String>,
    pub(crate) content: String,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<PostFields, DomainError> {
        PostFields::validate(&self.title, self.image_url.as_deref(), &self.content)
    }
}

/// Partial update: absent fields keep their current value. An empty
/// `image_url` removes the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) content: Option<String>,
}

impl UpdatePostRequest {
    /// Merges the patch onto `current` and validates the merged values.
    pub(crate) fn apply_to(self, current: &Post) -> Result<PostFields, DomainError> {
        let title = self.title.as_deref().unwrap_or(&current.title);
        let image_url = match self.image_url.as_deref() {
            Some(image_url) => Some(image_url),
            None => current.image_url.as_deref(),
        };
        let content = self.content.as_deref().unwrap_or(&current.content);

        PostFields::validate(title, image_url, content)
    }
}

impl Post {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: i64,
        title: impl Into<String>,
        image_url: Option<String>,
        content: impl Into<String>,
        username: impl Into<String>,
        user_id: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("user_id", user_id)?;
        let fields = PostFields::validate(&title.into(), image_url.as_deref(), &content.into())?;

        let username = username.into();
        if username.trim().is_empty() {
            return Err(DomainError::validation("username", "must not be empty"));
        }

        if updated_at < created_at {
            return Err(DomainError::validation("updated_at", "must be >= created_at"));
        }

        Ok(Self {
            id,
            title: fields.title,
            image_url: fields.image_url,
            content: fields.content,
            username,
            user_id,
            created_at,
            updated_at,
        })
    }

    pub(crate) fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::validation(field, "must be > 0"));
    }
    Ok(())
}

fn normalize_title(title: &str) -> Result<String, FieldViolation> {
    let title = title.trim();
    let len = title.chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        return Err(FieldViolation {
            field: "title",
            message: "must be 5..120 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_content(content: &str) -> Result<String, FieldViolation> {
    let content = content.trim();
    if content.chars().count() < CONTENT_MIN_CHARS {
        return Err(FieldViolation {
            field: "content",
            message: "must be at least 50 chars",
        });
    }
    Ok(content.to_string())
}

fn normalize_image_url(image_url: Option<&str>) -> Result<Option<String>, FieldViolation> {
    let Some(image_url) = image_url.map(str::trim).filter(|url| !url.is_empty()) else {
        return Ok(None);
    };

    if !image_url_pattern().is_match(image_url) {
        return Err(FieldViolation {
            field: "imageURL",
            message: "must be an http(s) link to a jpg, jpeg, png, webp or gif image",
        });
    }
    Ok(Some(image_url.to_string()))
}

fn image_url_pattern() -> &'static Regex {
    static IMAGE_URL_REGEX: OnceLock<Regex> = OnceLock::new();
    IMAGE_URL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^https?://.+\.(jpg|jpeg|png|webp|gif)$")
            .expect("image url regex must compile")
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, Utc};

    use super::{CreatePostRequest, DomainError, Post, PostFields, UpdatePostRequest};

    pub(crate) const VALID_CONTENT: &str =
        "This content is long enough to pass the fifty character rule.";

    #[test]
    fn content_of_49_chars_is_rejected_and_50_accepted() {
        let short = "a".repeat(49);
        let err = PostFields::validate("Valid title", None, &short)
            .expect_err("49 chars must be rejected");
        assert_validation_field(err, "content");

        let exact = "a".repeat(50);
        let fields = PostFields::validate("Valid title", None, &exact).expect("50 chars is ok");
        assert_eq!(fields.content.chars().count(), 50);
    }

    #[test]
    fn content_length_is_counted_after_trimming() {
        let padded = format!("   {}   ", "a".repeat(49));
        assert!(PostFields::validate("Valid title", None, &padded).is_err());
    }

    #[test]
    fn title_bounds_are_inclusive() {
        assert!(PostFields::validate("abcd", None, VALID_CONTENT).is_err());
        assert!(PostFields::validate("abcde", None, VALID_CONTENT).is_ok());
        assert!(PostFields::validate(&"t".repeat(120), None, VALID_CONTENT).is_ok());
        assert!(PostFields::validate(&"t".repeat(121), None, VALID_CONTENT).is_err());
    }

    #[test]
    fn image_url_must_point_to_an_image() {
        let ok = PostFields::validate(
            "Valid title",
            Some(" https://cdn.example.com/cat.JPG "),
            VALID_CONTENT,
        )
        .expect("image url must be accepted");
        assert_eq!(ok.image_url.as_deref(), Some("https://cdn.example.com/cat.JPG"));

        let err = PostFields::validate(
            "Valid title",
            Some("ftp://example.com/cat.png"),
            VALID_CONTENT,
        )
        .expect_err("non-http url must be rejected");
        assert_validation_field(err, "imageURL");

        assert!(
            PostFields::validate("Valid title", Some("https://example.com/doc.pdf"), VALID_CONTENT)
                .is_err()
        );
    }

    #[test]
    fn blank_image_url_means_no_image() {
        let fields =
            PostFields::validate("Valid title", Some("   "), VALID_CONTENT).expect("must validate");
        assert!(fields.image_url.is_none());
    }

    #[test]
    fn create_post_request_reports_all_violations() {
        let req = CreatePostRequest {
            title: "abc".to_string(),
            image_url: Some("not a url".to_string()),
            content: "short".to_string(),
        };

        let err = req.validate().expect_err("must be rejected");
        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["title", "imageURL", "content"]);
    }

    #[test]
    fn update_request_keeps_absent_fields() {
        let post = sample_post();
        let patch = UpdatePostRequest {
            title: Some("  A brand new title  ".to_string()),
            ..UpdatePostRequest::default()
        };

        let merged = patch.apply_to(&post).expect("must validate");
        assert_eq!(merged.title, "A brand new title");
        assert_eq!(merged.content, post.content);
        assert_eq!(merged.image_url, post.image_url);
    }

    #[test]
    fn update_request_with_empty_image_url_clears_it() {
        let post = sample_post();
        let patch = UpdatePostRequest {
            image_url: Some(String::new()),
            ..UpdatePostRequest::default()
        };

        let merged = patch.apply_to(&post).expect("must validate");
        assert!(merged.image_url.is_none());
    }

    #[test]
    fn update_request_validates_merged_values() {
        let post = sample_post();
        let patch = UpdatePostRequest {
            content: Some("too short".to_string()),
            ..UpdatePostRequest::default()
        };

        let err = patch.apply_to(&post).expect_err("must be rejected");
        assert_validation_field(err, "content");
    }

    #[test]
    fn post_new_rejects_non_positive_user_id() {
        let now = Utc::now();
        let err = Post::new(1, "Title here", None, VALID_CONTENT, "author", 0, now, now)
            .expect_err("user_id must be > 0");
        assert_validation_field(err, "user_id");
    }

    #[test]
    fn post_new_rejects_updated_before_created() {
        let updated_at = Utc::now();
        let created_at = updated_at + Duration::seconds(1);

        let err = Post::new(
            1,
            "Title here",
            None,
            VALID_CONTENT,
            "author",
            10,
            created_at,
            updated_at,
        )
        .expect_err("updated_at < created_at must fail");
        assert_validation_field(err, "updated_at");
    }

    fn sample_post() -> Post {
        let now = Utc::now();
        Post::new(
            1,
            "Original title",
            Some("https://example.com/a.png".to_string()),
            VALID_CONTENT,
            "author",
            10,
            now,
            now,
        )
        .expect("sample post must be valid")
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation(violations) => {
                assert!(
                    violations.iter().any(|v| v.field == expected_field),
                    "expected violation for {expected_field}, got {violations:?}"
                );
            }
            other => panic!("expected DomainError::Validation, got {other:?}"),
        }
    }
}
