// wttr_exporter - Prometheus metrics exporter for wttr.in
//
// Copyright 2023 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use std::error;
use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    Transport(reqwest::Error),
    MalformedBody(reqwest::Error),
    Unexpected(StatusCode, Url),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{}", e),
            Self::MalformedBody(e) => write!(f, "malformed response body: {}", e),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
        }
    }
}

impl error::Error for FetchError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::MalformedBody(e) => Some(e),
            _ => None,
        }
    }
}

/// Client for fetching current weather conditions from a wttr.in compatible API.
///
/// Requests are bounded by whatever timeout the underlying `reqwest::Client` was
/// built with. The client itself never retries; callers decide when to try again.
#[derive(Debug)]
pub struct WttrClient {
    client: Client,
    base_url: Url,
}

impl WttrClient {
    const USER_AGENT: &'static str = "wttr_exporter Prometheus Exporter (https://github.com/56quarters/wttr_exporter)";
    const JSON_RESPONSE: &'static str = "application/json";
    const JSON_FORMAT: &'static str = "j1";

    pub fn new(client: Client, base_url: &str) -> Self {
        WttrClient {
            client,
            // TODO(56quarters): Handle this better
            base_url: Url::parse(base_url).unwrap(),
        }
    }

    /// Fetch the raw observation document for the given location.
    ///
    /// The document is returned as parsed but otherwise unvalidated JSON. Transport
    /// failures, non-200 responses, and bodies that are not JSON at all are fetch
    /// errors; a JSON body missing the expected fields is not, that is for the
    /// extraction step to decide.
    pub async fn current(&self, location: &str) -> Result<Value, FetchError> {
        let request_url = self.current_url(location);
        tracing::debug!(message = "making current conditions request", url = %request_url);

        let res = self.make_request(request_url).await?;
        res.json::<Value>().await.map_err(FetchError::MalformedBody)
    }

    async fn make_request(&self, url: Url) -> Result<Response, FetchError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = res.status();
        if status == StatusCode::OK {
            Ok(res)
        } else {
            Err(FetchError::Unexpected(status, url))
        }
    }

    fn current_url(&self, location: &str) -> Url {
        let encoded_location = utf8_percent_encode(location, NON_ALPHANUMERIC);
        let mut url = self.base_url.clone();
        {
            url.path_segments_mut()
                .map(|mut p| {
                    p.clear().push(&encoded_location.to_string());
                })
                .expect("unable to modify URL path segments");
        }
        url.query_pairs_mut().clear().append_pair("format", Self::JSON_FORMAT);

        url
    }
}

#[cfg(test)]
mod test {
    use super::WttrClient;
    use reqwest::Client;

    #[test]
    fn test_current_url_plain_location() {
        let client = WttrClient::new(Client::new(), "https://wttr.in/");
        let url = client.current_url("Berlin");

        assert_eq!("https://wttr.in/Berlin?format=j1", url.as_str());
    }

    #[test]
    fn test_current_url_location_encoded() {
        let client = WttrClient::new(Client::new(), "https://wttr.in/");
        let url = client.current_url("New York");

        assert_eq!("https://wttr.in/New%20York?format=j1", url.as_str());
    }
}
