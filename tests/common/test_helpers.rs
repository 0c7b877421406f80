use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use healthymeal::{
    AiMetadata, BackendResponse, DietaryPreferences, Modification, ModifiedRecipe,
    PreviewBackend, PreviewPayload, Recipe, TransportError,
};
use tokio::sync::{oneshot, Notify};

pub fn sample_recipe(id: &str) -> Recipe {
    Recipe {
        id: id.into(),
        title: "Creamy Mushroom Pasta".into(),
        ingredients: "200g pasta, 250g mushrooms, 200ml cream, parmesan".into(),
        instructions: "Boil pasta. Fry mushrooms. Stir in cream and cheese.".into(),
    }
}

pub fn sample_preferences() -> DietaryPreferences {
    DietaryPreferences {
        diet_type: Some("vegan".into()),
        allergies: vec!["peanuts".into()],
        disliked_ingredients: vec!["olives".into()],
    }
}

pub fn sample_modification() -> Modification {
    Modification {
        modified_recipe: ModifiedRecipe {
            title: "Vegan Mushroom Pasta".into(),
            ingredients: "200g pasta, 250g mushrooms, 200ml oat cream, nutritional yeast".into(),
            instructions: "Boil pasta. Fry mushrooms. Stir in oat cream and yeast.".into(),
            explanation: "Replaced dairy with plant-based alternatives.".into(),
        },
        ai_metadata: AiMetadata {
            model: "test-model".into(),
            provider: "stub".into(),
            generation_duration: 1200,
            raw_response: "{}".into(),
        },
    }
}

pub fn sample_payload(recipe_id: &str) -> PreviewPayload {
    let modification = sample_modification();
    PreviewPayload {
        original_recipe: sample_recipe(recipe_id),
        modified_recipe: modification.modified_recipe,
        ai_metadata: modification.ai_metadata,
        applied_preferences: sample_preferences(),
    }
}

/// Backend answering every call with the same outcome and counting calls.
#[derive(Debug)]
pub struct StubBackend {
    outcome: Result<BackendResponse, TransportError>,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn responding(response: BackendResponse) -> Self {
        Self { outcome: Ok(response), calls: AtomicUsize::new(0) }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::responding(BackendResponse::json(status, &body))
    }

    pub fn failing(err: TransportError) -> Self {
        Self { outcome: Err(err), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewBackend for StubBackend {
    async fn request_preview(&self, _recipe_id: &str) -> Result<BackendResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

type Reply = Result<BackendResponse, TransportError>;

/// Backend whose calls block until the test sends each reply, in call order.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    entered: Notify,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply slot for the next call.
    pub fn script(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().expect("replies lock").push_back(rx);
        tx
    }

    /// Wait until a call has reached the backend.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewBackend for ScriptedBackend {
    async fn request_preview(&self, _recipe_id: &str) -> Result<BackendResponse, TransportError> {
        let reply = self.replies.lock().expect("replies lock").pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        match reply {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(TransportError::new("reply dropped"))),
            None => Err(TransportError::new("unscripted call")),
        }
    }
}
