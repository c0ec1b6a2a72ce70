//! Prompt construction for the AI recommendation call.

use crate::models::MovieAction;

/// How many favorites / top-rated titles are summarized for the model
pub const PREFERENCE_LIMIT: i64 = 10;

fn describe(action: &MovieAction) -> String {
    let movie = &action.movie;
    let category = movie.category.as_deref().unwrap_or("unknown category");
    let region = movie.region.as_deref().unwrap_or("unknown region");
    let score = movie
        .score
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| "unrated".to_string());
    format!("{} ({}, {}, {})", movie.title, category, region, score)
}

fn push_list(out: &mut String, heading: &str, actions: &[MovieAction], with_user_rating: bool) {
    out.push_str(heading);
    out.push('\n');
    if actions.is_empty() {
        out.push_str("- (none)\n");
        return;
    }
    for action in actions {
        out.push_str("- ");
        out.push_str(&describe(action));
        if with_user_rating {
            if let Some(rating) = action.rating {
                out.push_str(&format!(", my rating: {:.1}", rating));
            }
        }
        out.push('\n');
    }
}

/// Renders the fixed recommendation prompt from a user's favorites and
/// top-rated movies.
///
/// Callers must not invoke the remote model when both lists are empty; the
/// pipeline short-circuits with an "insufficient preference data" response
/// instead.
pub fn build_prompt(favorites: &[MovieAction], top_rated: &[MovieAction]) -> String {
    let mut prompt = String::from(
        "You are a movie recommendation assistant. Based on my viewing \
         preferences below, recommend 6 movies I have not listed.\n\n",
    );

    push_list(&mut prompt, "Movies I favorited:", favorites, false);
    prompt.push('\n');
    push_list(&mut prompt, "Movies I rated highly:", top_rated, true);

    prompt.push_str(
        "\nEach listed item is formatted as: title (category, region, catalog score).\n\
         \n\
         Reply with a single JSON object and nothing else, in this exact shape:\n\
         {\n\
           \"analysis\": \"one short paragraph describing my taste\",\n\
           \"recommendations\": [\n\
             {\"title\": \"...\", \"type\": \"...\", \"region\": \"...\", \"score\": 8.5, \"reason\": \"...\"}\n\
           ]\n\
         }\n\
         Do not wrap the JSON in markdown fences or add commentary.\n",
    );

    prompt
}
