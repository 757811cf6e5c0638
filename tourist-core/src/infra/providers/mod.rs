pub mod flickr;

pub use flickr::{
    FlickrClient, FlickrConfig, RemoteImageSearch, SearchOutcome,
    parse_search_response,
};

#[cfg(test)]
pub use flickr::MockRemoteImageSearch;
