//! # AgroClaw Agent
//!
//! The advisory chat pipeline: retrieve relevant documents, assemble
//! the prompt, generate through the model fallback chain, and extract
//! the answer. Provider failures degrade into fixed user-facing
//! messages; the endpoint itself never errors on a chat turn.

pub mod extract;
pub mod prompt;

use std::sync::Arc;

use agroclaw_core::traits::TextModel;
use agroclaw_core::types::{ChatRequest, ChatResponse, InstructionId, SystemInstruction};
use agroclaw_core::{AgroClawError, Result};
use agroclaw_providers::ModelFallback;
use agroclaw_rag::Retriever;

/// Persona and scope policy, bound to every generation as a system
/// instruction. The advisor answers in Turkish and stays inside the
/// agricultural domain.
pub const SYSTEM_PROMPT: &str = r#"
Sen, "Chatbot Destekli Akıllı Tarım Uygulaması" için özel olarak
tasarlanmış bir yapay zekâ danışmanısın. Tüm yanıtların yalnızca bu
uygulamanın kapsamı ve amacı doğrultusunda üretilmelidir. Cevap verirken
kullanıcı ile konuştuğunu unutma. Veri tabanından gelen bilgileri kullanırken
"verdiğiniz bilgi" gibi ifadeler kullanma. Bilgiyi doğal bir sohbet akışı içinde sun.
Sürekli olarak "veri tabanımızda bulunan haberlere göre" diyerek kendini tekrar etme.

1. Uygulamanın amacı tarım ile ilgilenen kullanıcılar için:
- Tarım haberleri,
- Meteorolojik veriler,
- Bitki yetiştirme rehberleri,
- Hastalık ve zararlı tanımları,
- Sulama, gübreleme ve bakım önerileri,
- Haftalık tarım ipuçları,
- Tarımsal karar destek bilgileri
sunmaktır.

2. Cevapların yalnızca şu bilgi alanlarıyla sınırlı olmalıdır:
- Tarım haberleri
- İklim ve meteoroloji verileri
- Bitki yetiştirme bilgileri
- Gübreleme, sulama ve bakım teknikleri
- Zararlı ve hastalık belirtileri
- Kullanıcıdan gelen bağlam
- Uygulamada yer alan rehber içerikler

Bu alanların dışında bilgi üretmek yasaktır. Ancak kullanıcı veritabanındaki bir konsept hakkında (örneğin "nasıl çalışır") detaylı bilgi isterse, genel tarım bilginle konuyu açabilirsin.

3. Her zaman "Akıllı Tarım Danışmanı" rolünde yanıt vermelisin.
Yanıtların teknik, doğru, anlaşılır ve tarım odaklı olmalıdır. Gereksiz
sohbet, hikâye, tahmin veya tarım dışı içerik üretmemelisin.

4. Kullanıcı tarım dışı bir konu sorarsa şu şekilde yanıt ver:

"Bu uygulama tarımsal danışmanlık amacıyla tasarlanmıştır. Sorunuz
uygulama kapsamı dışındadır. Tarımla ilgili bir konuda yardımcı
olabilirim."

Son kural: Tüm yanıtların yalnızca Chatbot Destekli Akıllı Tarım Uygulaması kapsamında olmalıdır.
"#;

/// Shown when every model/key combination ran out of quota.
pub const BUSY_MESSAGE: &str =
    "Sistem şu anda çok yoğun (Kota limiti aşıldı). Lütfen bir süre sonra tekrar deneyin.";

/// Shown on any other generation failure.
pub const ERROR_MESSAGE: &str =
    "Sistemde beklenmeyen bir hata oluştu. Lütfen bağlantınızı kontrol edin.";

pub struct Advisor {
    provider: Arc<dyn TextModel>,
    retriever: Arc<Retriever>,
    fallback: ModelFallback,
    instruction: SystemInstruction,
}

impl Advisor {
    pub fn new(
        provider: Arc<dyn TextModel>,
        retriever: Arc<Retriever>,
        model_priority: Vec<String>,
    ) -> Self {
        Self {
            provider,
            retriever,
            fallback: ModelFallback::new(model_priority),
            instruction: SystemInstruction::new(InstructionId::Advisor, SYSTEM_PROMPT),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// One chat turn. Retrieval failures degrade to a context-free
    /// answer; generation failures degrade to a fixed error response.
    pub async fn chat(&self, request: &ChatRequest) -> ChatResponse {
        let docs = self.retriever.search(&request.message).await;
        if !docs.is_empty() {
            tracing::info!("📚 Retrieved {} relevant documents", docs.len());
        }

        let prompt = prompt::assemble(&request.message, &request.conversation_history, &docs);

        let provider = &self.provider;
        let instruction = &self.instruction;
        let prompt_ref = &prompt;
        let result = self
            .fallback
            .generate(|model| async move {
                tracing::info!("🤖 Attempting generation with model: {model}");
                provider.generate(&model, prompt_ref, Some(instruction)).await
            })
            .await;

        match result {
            Ok(value) => ChatResponse::success(extract::response_text_or_raw(&value)),
            Err(AgroClawError::QuotaExhausted(e)) => {
                tracing::warn!("⚠️ All models exhausted their quota: {e}");
                ChatResponse::error(BUSY_MESSAGE)
            }
            Err(e) => {
                tracing::error!("❌ Chat generation failed: {e}");
                ChatResponse::error(ERROR_MESSAGE)
            }
        }
    }

    /// Plain one-shot generation without retrieval or history, used by
    /// the simple text endpoint. Errors propagate to the caller.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let model = self
            .fallback
            .models()
            .first()
            .ok_or_else(|| AgroClawError::Provider("No generation models configured".into()))?;
        let value = self.provider.generate(model, prompt, None).await?;
        Ok(extract::response_text_or_raw(&value))
    }
}
