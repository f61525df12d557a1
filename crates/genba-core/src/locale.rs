//! Locale handling and the bilingual message catalog.
//!
//! Every user-facing string and prompt template lives here, one function per
//! message. Callers re-derive strings from the session's current locale on
//! each use, so a locale switch takes effect immediately.

use serde::{Deserialize, Serialize};

/// Supported display/answer languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ja,
    En,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::Ja => "ja",
            Locale::En => "en",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ja" | "japanese" | "日本語" => Some(Locale::Ja),
            "en" | "english" => Some(Locale::En),
            _ => None,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Localized user-facing texts and prompt templates
pub mod messages {
    use super::Locale;

    pub fn app_name(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "建設工事問い合わせチャットボット",
            Locale::En => "Construction Site Inquiry Chatbot",
        }
    }

    pub fn boot_message(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "アプリが起動されました。",
            Locale::En => "Application has been started.",
        }
    }

    pub fn chat_helper(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "こちらからメッセージを送信してください。",
            Locale::En => "Please send your message from here.",
        }
    }

    pub fn spinner_search(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "検索中...",
            Locale::En => "Searching...",
        }
    }

    pub fn spinner_contact(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => {
                "担当者へ問い合わせ内容を送信しています。画面を操作せず、そのままお待ちください。"
            }
            Locale::En => {
                "Sending your inquiry to our staff. Please do not operate the screen and wait."
            }
        }
    }

    pub fn contact_thanks(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => {
                "お問い合わせいただき、ありがとうございます。\n\
                 内容を確認の上、担当者より回答いたします。\n\
                 なお、土日祝日・年末年始にいただいたお問い合わせへの対応は翌営業日以降となります。\n\
                 ご了承ください。\n\
                 お急ぎの場合は、チラシに記載の武田の携帯電話までご連絡ください。"
            }
            Locale::En => {
                "Thank you for your inquiry.\n\
                 Our staff will review the content and respond.\n\
                 However, inquiries received on Saturdays, Sundays, holidays, and year-end/New Year holidays will be handled on the next business day.\n\
                 Thank you for your understanding.\n\
                 If urgent, please contact Mr. Takeda's mobile phone listed on the flyer."
            }
        }
    }

    /// Canonical answer substituted when the generator reports that no
    /// relevant context was found.
    pub fn no_doc_match(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => {
                "回答に必要な情報が見つかりませんでした。弊社の工事に関する質問内容に変更して、再度送信してください。"
            }
            Locale::En => {
                "The information necessary for an answer was not found. Please change your construction-related question and send it again."
            }
        }
    }

    pub fn common_error(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "このエラーが繰り返し発生する場合は、管理者にお問い合わせください。",
            Locale::En => "If this error occurs repeatedly, please contact the administrator.",
        }
    }

    pub fn initialize_error(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "初期化処理に失敗しました。",
            Locale::En => "Initialization process failed.",
        }
    }

    pub fn main_process_error(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "ユーザー入力に対しての処理に失敗しました。",
            Locale::En => "Failed to process user input.",
        }
    }

    pub fn chain_execution_error(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "RAGチェーンの実行に失敗しました。",
            Locale::En => "RAG chain execution failed.",
        }
    }

    pub fn input_limit_error(locale: Locale, limit: usize) -> String {
        match locale {
            Locale::Ja => format!(
                "入力されたテキストの文字数が受付上限（{}）を超えています。受付上限を超えないように再度入力してください。",
                limit
            ),
            Locale::En => format!(
                "The number of characters in the input text exceeds the acceptance limit ({}). Please enter again so as not to exceed the acceptance limit.",
                limit
            ),
        }
    }

    pub fn mail_settings_error(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "Gmailの設定が完了していません。管理者にお問い合わせください。",
            Locale::En => "Gmail settings are incomplete. Please contact the administrator.",
        }
    }

    pub fn mail_sending_error_detail(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "メール送信中にエラーが発生しました。管理者にお問い合わせください。",
            Locale::En => "An error occurred while sending email. Please contact the administrator.",
        }
    }

    pub fn forwarding_subject(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "【問い合わせ】AIチャットボットからの転送",
            Locale::En => "[Inquiry] Transfer from AI Chatbot",
        }
    }

    /// Email body for a forwarded inquiry. The recipient side is Japanese;
    /// under `en` the body carries both the original text and its Japanese
    /// translation.
    pub fn email_body(
        locale: Locale,
        message: &str,
        translated: Option<&str>,
        datetime: &str,
    ) -> String {
        match locale {
            Locale::Ja => format!(
                "以下の問い合わせがAIチャットボットから転送されました。\n\n\
                 【問い合わせ内容】\n{}\n\n\
                 【受信日時】\n{}\n\n\
                 【送信元】\nAIチャットボットシステム\n\n\
                 このメールは自動送信されています。",
                message, datetime
            ),
            Locale::En => format!(
                "以下の問い合わせがAIチャットボットから転送されました。\n\n\
                 【問い合わせ内容（英語）】\n{}\n\n\
                 【問い合わせ内容（日本語翻訳）】\n{}\n\n\
                 【受信日時】\n{}\n\n\
                 【送信元】\nAIチャットボットシステム\n\n\
                 このメールは自動送信されています。",
                message,
                translated.unwrap_or(message),
                datetime
            ),
        }
    }

    /// Prompt asking the model to translate English text into Japanese. The
    /// template itself is Japanese regardless of locale.
    pub fn translation_prompt(text: &str) -> String {
        format!(
            "以下の英語のテキストを自然な日本語に翻訳してください。\n\
             翻訳結果のみを返してください。\n\n\
             英語テキスト: {}\n\n\
             日本語翻訳:",
            text
        )
    }

    /// System instruction for rewriting the latest input into a standalone
    /// query understandable without the conversation history.
    pub fn rewrite_instruction(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => {
                "会話履歴と最新の入力をもとに、会話履歴なしでも理解できる独立した入力テキストを生成してください。"
            }
            Locale::En => {
                "Based on conversation history and latest input, generate independent input text that can be understood without conversation history."
            }
        }
    }

    /// System instruction for grounded answer generation. Contains the
    /// `{context}` slot the retrieved chunks are substituted into.
    pub fn answer_instruction(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => {
                "あなたは、建設工事の現場において、仕様書や施工計画書に基づいて近隣住民からの問い合わせに回答するアシスタントです。\n\
                 以下の条件に基づき、ユーザー入力に対して日本語で回答してください。\n\n\
                 【条件】\n\
                 1. ユーザー入力内容と以下の文脈との間に関連性がある場合のみ、以下の文脈に基づいて回答してください。\n\
                 2. ユーザー入力内容と以下の文脈との関連性が明らかに低い場合、「回答に必要な情報が見つかりませんでした。弊社の工事に関する質問内容に変更して、再度送信してください。」と回答してください。\n\
                 3. 憶測で回答せず、以下の文脈に基づいて回答してください。\n\
                 4. できる限りマークダウン記法を使って、詳細に回答してください。\n\
                 5. マークダウン記法で見出しを付ける場合、最も大きい見出しをh3としてください。\n\
                 6. 複雑な質問の場合、各項目について詳細に回答してください。\n\
                 7. 工事の終了時期や工期に関する質問には、必ず現場の掲示板を確認するか、工事責任者に確認するよう案内してください。\n\
                 8. チラシの配布に関する質問には、工事の2〜3日前に各住戸の前でチラシを配布すると回答してください。\n\
                 9. 工事場所に関する質問には、広島県東広島市八本松南4丁目の七ツ池ハイツであると回答してください。\n\
                 10. 必要と判断した場合は、以下の文脈に基づかない一般的な情報を回答しても構いません。\n\n\
                 {context}"
            }
            Locale::En => {
                "You are an assistant that responds to inquiries from residents at construction sites based on specifications and construction plans.\n\
                 Please respond to user input based on the following conditions, and answer in ENGLISH.\n\n\
                 【Conditions】\n\
                 1. Only when there is relevance between user input content and the following context, please respond based on the following context.\n\
                 2. If the relevance between user input content and the following context is clearly low, respond with \"The information necessary for an answer was not found. Please change your construction-related question and send it again.\"\n\
                 3. Do not answer with speculation, but answer based on the following context.\n\
                 4. Please answer in as much detail as possible using markdown notation.\n\
                 5. When using h tags for headings in markdown notation, make the largest heading h3.\n\
                 6. For complex questions, please answer each item in detail.\n\
                 7. For questions about the end of construction and construction period, be sure to check the bulletin board at the site or ask the construction manager to confirm.\n\
                 8. For questions about flyer distribution, answer that flyers will be distributed 2-3 days before construction in front of homes.\n\
                 9. For questions about construction location, answer that it is Nanatsu-ike Heights, Hachihonmatsu-minami 4-chome, Higashihiroshima City, Hiroshima Prefecture.\n\
                 10. If deemed necessary, you may provide general information without being based on the following context.\n\
                 11. IMPORTANT: Always respond in ENGLISH regardless of the input language.\n\n\
                 {context}"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_codes_and_names() {
        assert_eq!(Locale::parse("ja"), Some(Locale::Ja));
        assert_eq!(Locale::parse("English"), Some(Locale::En));
        assert_eq!(Locale::parse("fr"), None);
    }

    #[test]
    fn answer_instruction_carries_context_slot() {
        for locale in [Locale::Ja, Locale::En] {
            assert!(messages::answer_instruction(locale).contains("{context}"));
        }
    }

    #[test]
    fn english_body_embeds_translation() {
        let body = messages::email_body(
            Locale::En,
            "When does the work end?",
            Some("工事はいつ終わりますか？"),
            "2025年01月10日 09:00:00",
        );
        assert!(body.contains("When does the work end?"));
        assert!(body.contains("工事はいつ終わりますか？"));
    }
}
