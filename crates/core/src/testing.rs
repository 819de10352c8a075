//! Test doubles shared across module tests: in-memory PDF builders (no
//! binary fixtures) and a scripted chat client.

use crate::error::ChatError;
use crate::llm::{ChatClient, ChatMessage, FragmentStream};
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::Mutex;

fn single_page_pdf(operations: Vec<Operation>) -> Vec<u8> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let content = Content { operations };
    let content_id = document.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("content stream should encode"),
    ));

    let page_id = document.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages));

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .expect("pdf should serialize to memory");
    buffer
}

/// A one-page PDF whose only content is `text`.
pub(crate) fn pdf_with_text(text: &str) -> Vec<u8> {
    single_page_pdf(vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ])
}

/// A one-page PDF with no text operators at all, standing in for a scanned
/// image page.
pub(crate) fn pdf_without_text() -> Vec<u8> {
    single_page_pdf(vec![
        Operation::new("re", vec![10.into(), 10.into(), 100.into(), 100.into()]),
        Operation::new("f", vec![]),
    ])
}

/// Chat client that replays scripted fragments and records every request.
pub(crate) struct FakeChatClient {
    fragments: Vec<String>,
    fail_request: bool,
    fail_mid_stream: bool,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeChatClient {
    pub(crate) fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_request: false,
            fail_mid_stream: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_request() -> Self {
        let mut client = Self::with_fragments(Vec::<String>::new());
        client.fail_request = true;
        client
    }

    pub(crate) fn failing_mid_stream<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut client = Self::with_fragments(fragments);
        client.fail_mid_stream = true;
        client
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("lock should not be poisoned").len()
    }

    pub(crate) fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls
            .lock()
            .expect("lock should not be poisoned")
            .clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn stream_chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> Result<FragmentStream, ChatError> {
        self.calls
            .lock()
            .expect("lock should not be poisoned")
            .push(messages.to_vec());

        if self.fail_request {
            return Err(ChatError::Provider("simulated provider outage".to_string()));
        }

        let mut items: Vec<Result<String, ChatError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        if self.fail_mid_stream {
            items.push(Err(ChatError::MalformedStream(
                "simulated stream failure".to_string(),
            )));
        }

        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}
