use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response};
use tracing::{debug, info};

use super::base::{bearer, error_message, ApiClient};
use crate::error::BooksError;
use crate::models::Book;

/// Client for `/api/books`. Reads are public; writes need an admin's bearer token.
#[derive(Clone, Debug)]
pub struct BooksApi {
    client: ApiClient,
}

impl BooksApi {
    pub fn new(client: ApiClient) -> Self {
        BooksApi { client }
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, BooksError> {
        let url = self.client.endpoint(&["api", "books"]);
        debug!("Fetching books from {}", url);
        let response = check_status(self.client.http().get(url).send().await?).await?;
        let books: Vec<Book> = decode(response).await?;
        debug!("Fetched {} books", books.len());
        Ok(books)
    }

    pub async fn get_book(&self, id: &str) -> Result<Book, BooksError> {
        let url = self.client.endpoint(&["api", "books", id]);
        debug!("Fetching book from {}", url);
        let response = check_status(self.client.http().get(url).send().await?).await?;
        decode(response).await
    }

    /// Returns the stored record, or `None` if the server answered without one.
    pub async fn create_book(&self, token: &str, book: &Book) -> Result<Option<Book>, BooksError> {
        book.validate().map_err(BooksError::Invalid)?;
        let url = self.client.endpoint(&["api", "books"]);
        let request = authorized(self.client.http().post(url), token)?.json(book);
        let response = check_status(request.send().await?).await?;
        info!("Book \"{}\" added", book.title);
        decode_optional(response).await
    }

    pub async fn update_book(
        &self,
        token: &str,
        id: &str,
        book: &Book,
    ) -> Result<Option<Book>, BooksError> {
        book.validate().map_err(BooksError::Invalid)?;
        let url = self.client.endpoint(&["api", "books", id]);
        let request = authorized(self.client.http().put(url), token)?.json(book);
        let response = check_status(request.send().await?).await?;
        info!("Book \"{}\" updated", book.title);
        decode_optional(response).await
    }

    pub async fn delete_book(&self, token: &str, id: &str) -> Result<(), BooksError> {
        let url = self.client.endpoint(&["api", "books", id]);
        let request = authorized(self.client.http().delete(url), token)?;
        check_status(request.send().await?).await?;
        info!("Book {} deleted", id);
        Ok(())
    }
}

/// Attach the bearer token; an empty token is refused before anything is sent.
fn authorized(request: RequestBuilder, token: &str) -> Result<RequestBuilder, BooksError> {
    if token.trim().is_empty() {
        return Err(BooksError::MissingToken);
    }
    Ok(request.header(AUTHORIZATION, bearer(token)))
}

/// Turn a non-2xx response into `BooksError::Status`, preferring the server's
/// `error` field over the bare status line.
async fn check_status(response: Response) -> Result<Response, BooksError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| match status.canonical_reason() {
        Some(reason) => format!("Error: {} {}", status.as_u16(), reason),
        None => format!("Error: {}", status.as_u16()),
    });
    debug!("Books request failed with {}: {}", status, message);
    Err(BooksError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BooksError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| BooksError::Decode(e.to_string()))
}

async fn decode_optional(response: Response) -> Result<Option<Book>, BooksError> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(&body) {
        Ok(book) => Ok(Some(book)),
        Err(e) => {
            debug!("Could not parse book response, ignoring it: {}", e);
            Ok(None)
        }
    }
}
