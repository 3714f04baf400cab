use serde::{Deserialize, Serialize};

/// A structured research result as rendered in the chat.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ResearchResponse {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub web_findings: Vec<WebFinding>,
    #[serde(default)]
    pub academic_papers: Vec<AcademicPaper>,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct WebFinding {
    pub title: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub source_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AcademicPaper {
    pub title: Option<String>,
    pub authors: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub arxiv_id: Option<String>,
    pub arxiv_url: Option<String>,
    pub published_date: Option<String>,
    pub relevance_summary: Option<String>,
}

/// Only http(s) addresses are handed to the system browser.
fn web_link(url: Option<&str>) -> Option<&str> {
    let url = url?.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    (!rest.is_empty()).then_some(url)
}

impl WebFinding {
    /// Address behind the "Open source" link.
    pub fn link(&self) -> Option<&str> {
        web_link(self.url.as_deref())
    }

    /// Host part of the URL, shown under the card.
    pub fn domain(&self) -> Option<&str> {
        let url = self.url.as_deref()?;
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        rest.split('/').next().filter(|d| !d.is_empty())
    }
}

impl AcademicPaper {
    pub fn link(&self) -> Option<&str> {
        web_link(self.arxiv_url.as_deref())
    }
}

impl ResearchResponse {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.web_findings.is_empty()
            && self.academic_papers.is_empty()
            && self.key_takeaways.is_empty()
    }

    /// Flatten the result back into markdown for the clipboard.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        if !self.summary.is_empty() {
            out.push_str("## Summary\n");
            out.push_str(&self.summary);
            out.push_str("\n\n");
        }

        if !self.web_findings.is_empty() {
            out.push_str("## Web Findings\n");
            for finding in &self.web_findings {
                let title = finding.title.as_deref().unwrap_or("Untitled");
                match &finding.url {
                    Some(url) => out.push_str(&format!("- **{}** ({})\n", title, url)),
                    None => out.push_str(&format!("- **{}**\n", title)),
                }
                if let Some(summary) = &finding.summary {
                    out.push_str(&format!("  {}\n", summary));
                }
            }
            out.push('\n');
        }

        if !self.academic_papers.is_empty() {
            out.push_str("## Academic Papers\n");
            for paper in &self.academic_papers {
                let title = paper.title.as_deref().unwrap_or("Untitled Paper");
                out.push_str(&format!("- **{}**", title));
                if let Some(id) = &paper.arxiv_id {
                    out.push_str(&format!(" arXiv:{}", id));
                }
                out.push('\n');
                if let Some(authors) = &paper.authors {
                    out.push_str(&format!("  {}\n", authors));
                }
                if let Some(relevance) = &paper.relevance_summary {
                    out.push_str(&format!("  {}\n", relevance));
                }
            }
            out.push('\n');
        }

        if !self.key_takeaways.is_empty() {
            out.push_str("## Key Takeaways\n");
            for (i, takeaway) in self.key_takeaways.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, takeaway));
            }
        }

        out.trim_end().to_string()
    }

    /// Canned result used by the sample data toggle.
    pub fn sample() -> Self {
        ResearchResponse {
            summary: "Retrieval-Augmented Generation has moved from a single retrieve-then-read step \
                      to **adaptive** pipelines. Current systems decide when to retrieve, combine dense \
                      and sparse search, and check their own drafts against the retrieved passages."
                .to_string(),
            web_findings: vec![
                WebFinding {
                    title: Some("Production RAG checklist".to_string()),
                    url: Some("https://docs.example.org/rag/checklist".to_string()),
                    summary: Some(
                        "Chunk sizing, embedding model choice and hybrid retrieval settings for deployed systems."
                            .to_string(),
                    ),
                    source_type: Some("Documentation".to_string()),
                },
                WebFinding {
                    title: Some("Re-ranking retrieved passages in practice".to_string()),
                    url: Some("https://blog.example.net/posts/reranking".to_string()),
                    summary: Some(
                        "Measurements of cross-encoder re-ranking on top of vector search.".to_string(),
                    ),
                    source_type: Some("Blog Post".to_string()),
                },
            ],
            academic_papers: vec![
                AcademicPaper {
                    title: Some("REALM: Retrieval-Augmented Language Model Pre-Training".to_string()),
                    authors: Some("Kelvin Guu, Kenton Lee, Zora Tung, Panupong Pasupat, Ming-Wei Chang".to_string()),
                    abstract_text: Some(
                        "Augments language model pre-training with a learned retriever over a large corpus."
                            .to_string(),
                    ),
                    arxiv_id: Some("2002.08909".to_string()),
                    arxiv_url: Some("https://arxiv.org/abs/2002.08909".to_string()),
                    published_date: Some("2020-02-10".to_string()),
                    relevance_summary: Some("Early retrieval-augmented pre-training work.".to_string()),
                },
                AcademicPaper {
                    title: Some(
                        "Self-RAG: Learning to Retrieve, Generate, and Critique through Self-Reflection".to_string(),
                    ),
                    authors: Some("Akari Asai, Zeqiu Wu, Yizhong Wang, Avirup Sil, Hannaneh Hajishirzi".to_string()),
                    abstract_text: Some(
                        "Trains a model to retrieve on demand and to critique its own generations with reflection tokens."
                            .to_string(),
                    ),
                    arxiv_id: Some("2310.11511".to_string()),
                    arxiv_url: Some("https://arxiv.org/abs/2310.11511".to_string()),
                    published_date: Some("2023-10-17".to_string()),
                    relevance_summary: Some("Adaptive retrieval driven by self-reflection.".to_string()),
                },
            ],
            key_takeaways: vec![
                "Adaptive retrieval beats always-retrieve on knowledge-heavy tasks.".to_string(),
                "Hybrid dense and sparse search is the usual production default.".to_string(),
                "Self-critique loops reduce unsupported claims.".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain() {
        let finding = WebFinding {
            url: Some("https://pinecone.io/blog/production-rag".to_string()),
            ..Default::default()
        };
        assert_eq!(finding.domain(), Some("pinecone.io"));

        let plain = WebFinding {
            url: Some("example.com/x".to_string()),
            ..Default::default()
        };
        assert_eq!(plain.domain(), Some("example.com"));

        assert_eq!(WebFinding::default().domain(), None);
    }

    #[test]
    fn test_links_are_http_only() {
        let finding = |url: &str| WebFinding {
            url: Some(url.to_string()),
            ..Default::default()
        };
        assert_eq!(finding(" https://pinecone.io/blog ").link(), Some("https://pinecone.io/blog"));
        assert_eq!(finding("http://example.com").link(), Some("http://example.com"));
        assert_eq!(finding("javascript:alert(1)").link(), None);
        assert_eq!(finding("file:///etc/passwd").link(), None);
        assert_eq!(finding("https://").link(), None);
        assert_eq!(WebFinding::default().link(), None);

        let paper = AcademicPaper {
            arxiv_url: Some("https://arxiv.org/abs/2002.08909".to_string()),
            ..Default::default()
        };
        assert_eq!(paper.link(), Some("https://arxiv.org/abs/2002.08909"));
        assert_eq!(AcademicPaper::default().link(), None);
    }

    #[test]
    fn test_abstract_field_name() {
        let paper: AcademicPaper = serde_json::from_str(r#"{"title":"T","abstract":"A"}"#).unwrap();
        assert_eq!(paper.abstract_text.as_deref(), Some("A"));
    }

    #[test]
    fn test_to_markdown_sections() {
        let response = ResearchResponse {
            summary: "Short summary".to_string(),
            web_findings: vec![WebFinding {
                title: Some("Site".to_string()),
                url: Some("https://site.test".to_string()),
                ..Default::default()
            }],
            academic_papers: vec![],
            key_takeaways: vec!["one".to_string(), "two".to_string()],
        };

        let md = response.to_markdown();
        assert!(md.starts_with("## Summary\nShort summary"));
        assert!(md.contains("- **Site** (https://site.test)"));
        assert!(!md.contains("Academic Papers"));
        assert!(md.ends_with("1. one\n2. two"));
    }

    #[test]
    fn test_sample_is_complete() {
        let sample = ResearchResponse::sample();
        assert!(!sample.is_empty());
        assert!(!sample.summary.is_empty());
        assert!(!sample.web_findings.is_empty());
        assert!(!sample.academic_papers.is_empty());
        assert!(!sample.key_takeaways.is_empty());
        assert!(ResearchResponse::default().is_empty());
    }
}
