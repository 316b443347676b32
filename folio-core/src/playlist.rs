/// Featured playlists and their embed URIs
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::{all_consuming, opt, rest},
    sequence::{preceded, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub artist: String,
    pub cover_uri: String,
    /// Share link as copied from the player, or a `spotify:` URI
    pub share_url: String,
}

impl Playlist {
    /// URI handed to the embed, e.g. `spotify:playlist:5uFOAitxMHf3sINYaV1s8l`
    pub fn embed_uri(&self) -> Option<String> {
        embed_uri(&self.share_url)
    }
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

fn resource_kind(input: &str) -> IResult<&str, &str> {
    alt((
        tag("playlist"),
        tag("album"),
        tag("track"),
        tag("artist"),
        tag("episode"),
        tag("show"),
    ))(input)
}

/// `https://open.spotify.com/[intl-xx/]<kind>/<id>[?query]`
fn share_link(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = preceded(opt(alt((tag("https://"), tag("http://")))), tag("open.spotify.com/"))(input)?;
    let (input, _) = opt(tuple((tag("intl-"), take_while1(|c: char| c.is_ascii_alphabetic()), tag("/"))))(input)?;
    let (input, kind) = resource_kind(input)?;
    let (input, id) = preceded(tag("/"), take_while1(is_segment_char))(input)?;
    let (input, _) = opt(preceded(alt((tag("?"), tag("#"))), rest))(input)?;
    Ok((input, (kind, id)))
}

/// `spotify:<kind>:<id>`
fn spotify_uri(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = tag("spotify:")(input)?;
    let (input, kind) = resource_kind(input)?;
    let (input, id) = preceded(tag(":"), take_while1(is_segment_char))(input)?;
    Ok((input, (kind, id)))
}

pub fn embed_uri(share_url: &str) -> Option<String> {
    let (_, (kind, id)) = all_consuming(alt((spotify_uri, share_link)))(share_url.trim()).ok()?;
    Some(format!("spotify:{kind}:{id}"))
}

pub fn default_playlists() -> Vec<Playlist> {
    vec![
        Playlist {
            name: "Cinematic Sessions".into(),
            artist: "Kartik".into(),
            cover_uri: "/assets/sample-portrait.jpg".into(),
            share_url: "https://open.spotify.com/playlist/5uFOAitxMHf3sINYaV1s8l?si=SUbGWuJGTwSjS9_6_y6VQg".into(),
        },
        Playlist {
            name: "Behind the Lens".into(),
            artist: "Original Soundtrack".into(),
            cover_uri: "/assets/sample-landscape.jpg".into(),
            share_url: "https://open.spotify.com/playlist/5ScyGPT9yln8qiBVXidF6J?si=PCIz2LlCSDau3fdF9mKbig".into(),
        },
    ]
}
