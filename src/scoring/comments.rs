use crate::{new_id, Comment, CookedError, CookedResult, Post};

pub fn add_comment<'a>(
    post: &'a mut Post,
    author: &str,
    author_id: Option<&str>,
    text: &str,
    timestamp: i64,
) -> CookedResult<&'a Comment> {
    if text.trim().is_empty() {
        return Err(CookedError::Validation("comment text is empty".to_string()));
    }

    post.comments.push(Comment {
        id: new_id(),
        author: author.to_string(),
        author_id: author_id.map(str::to_string),
        text: text.to_string(),
        timestamp,
    });

    post.comments
        .last()
        .ok_or_else(|| CookedError::Storage("comment was not stored".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PostKind;

    fn post() -> Post {
        Post::pending(
            PostKind::Shame,
            "jim".to_string(),
            None,
            "replied love you too".to_string(),
            None,
        )
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut post = post();
        for text in ["", "   ", "\n\t"] {
            let result = add_comment(&mut post, "dave", None, text, 1);
            assert!(matches!(result, Err(CookedError::Validation(_))));
        }
        assert!(post.comments.is_empty());
    }

    #[test]
    fn comments_append_in_order() {
        let mut post = post();
        add_comment(&mut post, "dave", Some("user_1"), "first", 1).unwrap();
        let second = add_comment(&mut post, "sarah", None, "second", 2).unwrap().clone();

        assert_eq!(post.comments.len(), 2);
        assert_eq!(post.comments[1], second);
        assert_eq!(second.author, "sarah");
        assert_eq!(second.timestamp, 2);
        assert_eq!(post.comments[0].author_id.as_deref(), Some("user_1"));
        assert!(second.author_id.is_none());
        assert_ne!(post.comments[0].id, post.comments[1].id);
    }
}
