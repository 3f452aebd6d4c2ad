/*!
 * Prompt templates and assembly.
 *
 * The source text is fenced between content markers so the model cannot
 * confuse surrounding instructions with the passage to translate. The base
 * instruction block is repeated after the passage, which measurably reduces
 * instruction drift on long shards.
 */

/// Marker line wrapped around the passage inside every prompt. The
/// normalizer strips any echo of it from model output.
pub const CONTENT_MARKER: &str = "[**NỘI DUNG ĐOẠN VĂN**]";

/// Prefix for the glossary block appended to first-pass prompts.
pub const NAMES_HEADER: &str = "Danh sách các tên riêng và số lần xuất hiện ở các bản dịch trước, dựa vào nó khi dịch các tên riêng:";

const MODERN_PROMPT: &str = "\
Hãy đóng vai một dịch giả chuyên nghiệp, chuyên về thể loại truyện Hiện Đại. \
Dịch toàn bộ đoạn văn sau từ tiếng Trung sang tiếng Việt, tuân thủ nghiêm ngặt các yêu cầu sau:
1. Giữ nguyên tên riêng (nhân vật, công ty, địa danh, thương hiệu). Tên gốc tiếng Anh viết bằng Hán tự phải trả về tiếng Anh, không trả về Hán tự hoặc pinyin.
2. Ưu tiên từ thuần Việt, văn phong hiện đại, tự nhiên, mượt mà. Hạn chế Hán Việt trừ khi thông dụng.
3. Xưng hô hiện đại, nhất quán và chính xác theo quan hệ giữa các nhân vật (anh rể là chồng của chị gái, em dâu là vợ của em trai).
4. Không chuyển đổi đơn vị số học (200 vạn giữ nguyên là 200 vạn).
5. Bản dịch phải hoàn toàn bằng tiếng Việt. Bất kỳ ký tự tiếng Trung nào còn sót lại đều khiến bản dịch KHÔNG HỢP LỆ.
6. Chỉ cung cấp phần văn bản đã dịch, không giải thích, không chú thích, không bình luận.";

const CHINA_FANTASY_PROMPT: &str = "\
Hãy đóng vai một dịch giả chuyên nghiệp, chuyên về thể loại Tiên Hiệp và Huyền Huyễn. \
Dịch toàn bộ đoạn văn sau từ tiếng Trung sang tiếng Việt, tuân thủ nghiêm ngặt các yêu cầu sau:
1. Giữ nguyên tên riêng, địa danh, tên pháp bảo, công pháp, đan dược, linh thú. Trả về dạng Hán Việt, không trả về pinyin.
2. Từ Hán Việt thuộc ngữ cảnh tu tiên giữ nguyên (linh khí, nguyên thần, đạo tâm, cảnh giới). Từ ngoài ngữ cảnh dùng thuần Việt (nương thành mẹ, sáo lộ thành kịch bản).
3. Xưng hô cổ trang nhất quán theo quan hệ nhân vật (ta - ngươi, chàng - thiếp, sư phụ - đồ nhi).
4. Bản dịch phải hoàn toàn bằng tiếng Việt. Bất kỳ ký tự tiếng Trung nào còn sót lại đều khiến bản dịch KHÔNG HỢP LỆ.
5. Chỉ cung cấp phần văn bản đã dịch, không giải thích, không chú thích, không bình luận.";

const BOOK_INFO_PROMPT: &str = "\
Dịch tiêu đề / tên tác giả sau từ tiếng Trung sang tiếng Việt.
Ưu tiên sử dụng từ Hán Việt.
Chỉ cung cấp phần văn bản đã dịch hoàn chỉnh, không giải thích, không chú thích, không bình luận.";

const RESIDUE_CLEANUP_PROMPT: &str = "\
Đoạn văn sau là một bản dịch tiếng Việt còn sót lại một số từ hoặc cụm từ tiếng Trung chưa được dịch. \
Hãy dịch nốt các phần tiếng Trung còn sót sang tiếng Việt và giữ nguyên toàn bộ phần đã dịch đúng.
Không viết lại, không tóm tắt, không thay đổi nội dung đã dịch.
Bản trả về phải hoàn toàn bằng tiếng Việt, không còn bất kỳ ký tự tiếng Trung nào.
Chỉ cung cấp phần văn bản hoàn chỉnh, không giải thích, không chú thích, không bình luận.";

/// Instruction style used to build a translation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Contemporary fiction register.
    #[default]
    Modern,
    /// Xianxia / xuanhuan register with genre-specific vocabulary rules.
    ChinaFantasy,
    /// Short title/author translation, no fiction register.
    BookInfo,
    /// Finish an incomplete translation without rewriting the done parts.
    ResidueCleanup,
}

impl PromptStyle {
    fn template(&self) -> &'static str {
        match self {
            PromptStyle::Modern => MODERN_PROMPT,
            PromptStyle::ChinaFantasy => CHINA_FANTASY_PROMPT,
            PromptStyle::BookInfo => BOOK_INFO_PROMPT,
            PromptStyle::ResidueCleanup => RESIDUE_CLEANUP_PROMPT,
        }
    }
}

/// Assembles final prompts from templates, passage text and optional
/// glossary info.
#[derive(Debug, Default, Clone)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the full prompt for one shard. The passage is fenced between
    /// content markers, the instruction block appears both before and after
    /// it, and any additional info (the name glossary) goes last.
    pub fn build(text: &str, style: PromptStyle, additional_info: Option<&str>) -> String {
        let base = style.template();
        let fenced = format!("{CONTENT_MARKER}\n{}\n{CONTENT_MARKER}", text.trim());
        match additional_info {
            Some(info) if !info.trim().is_empty() => {
                format!("{base}\n{fenced}\n{base}\n\n{info}").trim().to_string()
            }
            _ => format!("{base}\n{fenced}\n{base}").trim().to_string(),
        }
    }

    /// Format a names glossary block for inclusion as additional info.
    pub fn names_block(formatted_names: &str) -> String {
        format!("{NAMES_HEADER}\n{formatted_names}")
    }
}
