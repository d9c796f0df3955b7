//! Built-in word list so the quiz is usable without a configured word bank.

use crate::domain::{Variants, Word, WordId};

fn seed(id: &str, hanzi: &str, pinyin: &[&str], translation: &[&str], level: u32) -> Word {
  Word {
    id: WordId::from(id),
    hanzi: hanzi.into(),
    pinyin: pinyin.iter().copied().collect::<Variants>(),
    translation: translation.iter().copied().collect::<Variants>(),
    level,
  }
}

pub fn seed_words() -> Vec<Word> {
  vec![
    seed("s001", "你好", &["nǐ hǎo"], &["hola", "buenos días"], 10),
    seed("s002", "谢谢", &["xiè xie"], &["gracias"], 10),
    seed("s003", "再见", &["zài jiàn"], &["adiós", "hasta luego"], 10),
    seed("s004", "我", &["wǒ"], &["yo"], 10),
    seed("s005", "你", &["nǐ"], &["tú"], 10),
    seed("s006", "他", &["tā"], &["él"], 10),
    seed("s007", "她", &["tā"], &["ella"], 10),
    seed("s008", "水", &["shuǐ"], &["agua"], 10),
    seed("s009", "茶", &["chá"], &["té"], 10),
    seed("s010", "不", &["bù"], &["no"], 10),
    seed("s011", "猫", &["māo"], &["gato"], 20),
    seed("s012", "狗", &["gǒu"], &["perro"], 20),
    seed("s013", "朋友", &["péng you", "péngyou"], &["amigo", "amiga"], 20),
    seed("s014", "老师", &["lǎo shī", "lǎoshī"], &["profesor", "maestro"], 20),
    seed("s015", "学生", &["xué sheng", "xuésheng"], &["estudiante", "alumno"], 20),
    seed("s016", "吃饭", &["chī fàn", "chīfàn"], &["comer"], 20),
    seed("s017", "喝", &["hē"], &["beber", "tomar"], 20),
    seed("s018", "今天", &["jīn tiān", "jīntiān"], &["hoy"], 40),
    seed("s019", "明天", &["míng tiān", "míngtiān"], &["mañana"], 40),
    seed("s020", "中国", &["zhōng guó", "zhōngguó"], &["China"], 40),
  ]
}
