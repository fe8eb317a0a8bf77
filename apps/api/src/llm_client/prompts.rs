// Prompt constants shared by the chat presets and resume analysis.

/// System prompt of the general career assistant chat.
pub const CAREER_COUNSELOR_SYSTEM: &str = "You are a career counselor AI assistant. \
    You help users analyze job descriptions, review and improve resumes, and provide \
    career insights and job search advice. Be supportive, professional, and offer \
    specific, actionable feedback.";

/// System prompt of the job description analyzer. The three marker lines are what
/// `MarkerInterpreter` extracts from each reply.
pub const JOB_ANALYZER_SYSTEM: &str = r#"You are a job description analyzer AI. Your task is to analyze job descriptions and provide structured output. Format your response exactly as follows:

SKILLS: [list the 5-8 most important technical and soft skills, separated by commas]
KEYWORDS: [list 8-12 recommended keywords for resumes/cover letters, separated by commas]
RATING: [a numerical score 0-100% rating how good the provided job description is]

After the structured data above, provide a detailed analysis explaining your findings. Be precise, analytical, and focus on actionable insights. If the user asks unrelated questions, ask them to send only job descriptions or their background for a suitability rating. Make important points bold."#;

pub const RESUME_COMPREHENSIVE_PROMPT: &str = r#"Please analyze this resume PDF and provide a comprehensive analysis in markdown format including:

## Resume Analysis Report

### 1. Overall Structure and Formatting Assessment
- Layout and visual appeal
- Section organization and hierarchy
- Font choices and consistency
- White space usage and readability
- Length appropriateness

### 2. Content Quality and Effectiveness
- Professional summary impact
- Work experience descriptions
- Skills presentation and relevance
- Education and certifications display
- Contact information completeness

### 3. Keyword Optimization and ATS Compatibility
- Industry-specific keywords present
- Missing keywords for better searchability
- ATS-friendly formatting assessment
- Potential parsing issues identified

### 4. Strengths and Areas for Improvement
- Key strengths to leverage
- Critical areas needing attention
- Missing sections or information
- Ways to better highlight achievements

### 5. Specific Action Items
- Priority improvements ranked by impact
- Concrete examples of better phrasing
- Formatting recommendations
- Next steps for optimization

Please be specific, actionable, and use clear markdown formatting throughout."#;

pub const RESUME_STRUCTURE_PROMPT: &str = r#"Analyze the structure and formatting of this resume PDF:

## Structure & Formatting Analysis

### Visual Layout Assessment
### Section Organization Review
### Typography and Consistency Check
### White Space and Readability Analysis
### Professional Appearance Evaluation

Provide specific recommendations for improvement."#;

pub const RESUME_KEYWORDS_PROMPT: &str = r#"Analyze this resume PDF for keyword optimization and ATS compatibility:

## Keyword & ATS Analysis

### Current Keywords Assessment
### Missing Industry Keywords
### ATS Compatibility Review
### Search Optimization Recommendations

Focus on actionable keyword suggestions and ATS improvements."#;

pub const RESUME_IMPACT_PROMPT: &str = r#"Focus on impact and achievements in this resume PDF:

## Impact & Achievement Analysis

### Current Achievements Review
### Quantification Opportunities
### Stronger Action Verbs Suggestions
### Before/After Improvement Examples

Provide specific ways to make accomplishments more impactful."#;

/// Custom resume analysis template. Replace `{request}` before sending.
pub const RESUME_CUSTOM_PROMPT_TEMPLATE: &str = "Please analyze this resume PDF with focus on: {request}

Provide detailed feedback in markdown format with specific recommendations.";
