//! Fixed bot texts: greetings, schedule payloads, and the filler pool.
//!
//! Everything here is a string constant loaded once at compile time; the
//! scheduler and command router only ever read from it.

use rand::seq::SliceRandom;

/// Morning broadcast, fired daily at the configured morning time.
pub const MORNING: &str =
    "Вставайте, Засранцы и давайте работайте над собой и на державу!";

/// Night broadcast, fired daily at the configured night time.
pub const NIGHT: &str =
    "Пора спать, Засранцы! Завтра все опять на работу, не проспите!";

/// Reply to `/start`.
pub const WELCOME: &str = "ОООО-о-о-о-о! Кого я вижу! Здорова, Перцы!!! Покалякаем?!";

/// Ephemeral acknowledgment sent while the model call is in flight.
pub const WAIT: &str = "Не уходи никуда, Умник! Готовлю ответ на твой вопрос...";

/// Shown when the IAM token exchange fails. The turn is aborted.
pub const AUTH_ERROR: &str = "Ошибка авторизации в Yandex Cloud.";

/// Substituted when the completion response has an unexpected shape.
pub const BAD_RESPONSE: &str = "Ошибка ответа.";

/// Substituted when the completion call itself fails.
pub const UPSTREAM_ERROR: &str = "Ошибка при обращении к Yandex GPT.";

/// Announced to the broadcast chat when the schedule is registered.
pub const SCHEDULE_STARTED: &str = "Расписание сообщений запущено!";

/// Shown when schedule registration fails.
pub const SCHEDULE_FAILED: &str = "Не получилось запустить расписание.";

/// Hint for unrecognized slash commands.
pub const UNKNOWN_COMMAND: &str =
    "Не понял команду. Есть /start, /random и /schedule — а остальное пиши словами.";

/// Pool of random filler broadcasts.
pub const FILLER: &[&str] = &[
    "Андрей, держись бодрей! А то Петька отмерзнет!",
    "Ну что, заскучали? Так займитесь делом!",
    "Пора бы и за работу, но лучше выпейте по 100 грамм!",
    "Кто охотчий до еды, пусть пожалует сюды...",
    "Чем вы вообще вот занимаетесь, что я должен вас все время контролировать?",
    "Андрей! Прекрати ЭТО делать! Коллеги могут увидеть!",
    "Шайтаны, ну вы чего? Кто это опять такую кучу навалял?!",
    "Саня, расскажи про БАБ и про женщин!",
    "Вадик, проснись! Тебя все ищут!",
    "Перцы, рассказывайте кому что снилось сегодня?",
    "МЕРНЕМ ДЖАНИД - значит на армянском (Дай мне умереть на твоем теле!)",
    "- Эх Яблочко да на тарелочке - Погибай же ты КОНТРА в перестрелочке!",
];

/// Pick one filler message uniformly at random.
pub fn random_filler() -> &'static str {
    FILLER
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FILLER[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_filler_is_pool_member() {
        for _ in 0..100 {
            let pick = random_filler();
            assert!(FILLER.contains(&pick));
        }
    }

    #[test]
    fn test_random_filler_covers_whole_pool() {
        // With 12 members, 2000 draws miss one with probability ~(11/12)^2000,
        // effectively zero.
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            seen.insert(random_filler());
        }
        assert_eq!(seen.len(), FILLER.len());
    }

    #[test]
    fn test_pool_has_no_duplicates() {
        let unique: HashSet<_> = FILLER.iter().collect();
        assert_eq!(unique.len(), FILLER.len());
    }
}
