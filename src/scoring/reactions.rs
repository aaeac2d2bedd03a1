use crate::Post;

/// "Press F". No cap, no dedup.
pub fn toggle_respect(post: &mut Post) -> u32 {
    post.reactions.respects += 1;
    post.reactions.respects
}

pub fn add_laugh(post: &mut Post) -> u32 {
    post.reactions.laughs += 1;
    post.reactions.laughs
}

/// Flips the viewer's W. Returns whether it is now set.
pub fn toggle_w(post: &mut Post) -> bool {
    flip(&mut post.has_marked_w, &mut post.reactions.wins)
}

/// Flips the viewer's L. Returns whether it is now set.
pub fn toggle_l(post: &mut Post) -> bool {
    flip(&mut post.has_marked_l, &mut post.reactions.losses)
}

fn flip(flag: &mut bool, counter: &mut u32) -> bool {
    if *flag {
        *counter = counter.saturating_sub(1);
    } else {
        *counter += 1;
    }
    *flag = !*flag;
    *flag
}
