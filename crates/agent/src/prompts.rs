//! Prompts for the generator, validator, tender summary and diagram calls.
//!
//! Brand colors and typefaces are written into the prompts from the
//! [`BrandPalette`] so the model is checked against the same constants the
//! renderer draws with.

use deck_core::text::excerpt;
use deck_core::model::NESTED_BULLET_PREFIX;
use deck_core::BrandPalette;
use std::fmt::Write;

/// Characters of markup sent to the validator.
pub const MARKUP_EXCERPT_CHARS: usize = 3000;

/// Characters of source content sent to the validator.
pub const SOURCE_EXCERPT_CHARS: usize = 1000;

/// Largest number of bullets a slide may carry.
pub const MAX_BULLETS_PER_SLIDE: usize = 6;

const GENERATOR_ROLE: &str = "\
You are a presentation architect. You turn source material into a structured \
slide deck that is rendered to HTML and then rebuilt as a fully editable \
PowerPoint file.";

const GENERATOR_RULES: &str = "\
## Slide types
- \"title\": cover slide, title and subtitle only. First slide only.
- \"section\": divider between major parts, title only (3-5 words). Use 1-3.
- \"content\": title and 3-6 concise bullets. The bulk of the deck.
- \"comparison\": title with \"left_bullets\" and \"right_bullets\" \
(before/after, options, pros/cons), 3-5 items each.
- \"conclusion\": closing call to action, summary and next steps. Last slide only.

## Rules
- Titles under 8 words, benefit oriented.
- Bullets of 5-10 words, active voice, specific to the source.
- One idea per slide; aim for 10-15 slides, never more than 20.
- Put visual suggestions and talking points in \"notes\".
- Return ONLY the JSON object, no commentary.

## Output (strict JSON)
{
  \"title\": \"Deck title\",
  \"subtitle\": \"Explanatory subtitle\",
  \"slides\": [
    {
      \"type\": \"title|section|content|comparison|conclusion\",
      \"title\": \"Slide title\",
      \"subtitle\": \"Optional\",
      \"bullets\": [\"Bullet\"],
      \"left_bullets\": [\"Only for comparison\"],
      \"right_bullets\": [\"Only for comparison\"],
      \"notes\": \"Speaker notes\"
    }
  ],
  \"key_messages\": [\"Key message\"]
}";

const VALIDATOR_ROLE: &str = "\
You are a validation agent for generated slide decks. You check markup \
correctness, brand charter compliance and faithfulness to the source request.";

const VALIDATOR_CHECKS: &str = "\
## Errors to detect
- Malformed HTML (unclosed tags) or invalid CSS.
- Colors or fonts outside the charter.
- Missing data-slide-type / data-notes attributes.
- Content that does not match the request.

## Response (strict JSON)
{
  \"validation_status\": \"valid|invalid|warning\",
  \"html_errors\": [],
  \"css_errors\": [],
  \"charter_violations\": [],
  \"content_issues\": [],
  \"suggestions\": [],
  \"needs_correction\": true,
  \"corrected_slides_data\": {}
}
Only include \"corrected_slides_data\" when \"needs_correction\" is true. It \
must be a complete deck in the same shape as the JSON structure you were given; \
it replaces the current deck entirely.";

const RFP_ROLE: &str = "\
You are a senior analyst of public tenders and requests for proposals for IT \
services and consulting firms. You turn a tender document into structured, \
decision-ready intelligence: should we bid, what is required, how to respond, \
and what the risks are. Write every value in professional French.";

const RFP_RULES: &str = "\
## Rules
- Extract every fact from the document; never invent or round figures \
(budgets, daily rates, volumes).
- Write \"NON SPÉCIFIÉ\" for anything the document does not state.
- Set \"calendrier.niveau_urgence\" from the days left before the offer \
deadline: CRITIQUE under 10 days, ÉLEVÉ under 20, STANDARD otherwise; ÉLEVÉ \
when the deadline is unclear.
- List atypical or discriminating clauses, ambiguities and missing budget \
information in \"points_attention\".
- Return ONLY the JSON object, no commentary, and keep every section even when \
it is nearly empty.

## Output (strict JSON)
{
  \"identification_marche\": {\"client_emetteur\": \"\", \"secteur_activite\": \"\", \
\"objet_consultation\": \"\", \"type_procedure\": \"\", \"nature_marche\": \"\", \
\"titulaires_actuels\": \"\", \"synthese_executive\": \"3 lines max\"},
  \"lots\": [{\"numero\": 1, \"intitule\": \"\", \"perimetre\": \"\", \"volume_estime\": \"\", \
\"budget_annuel\": \"\", \"budget_total\": \"\"}],
  \"budget_global\": {\"annuel\": \"\", \"total\": \"\"},
  \"calendrier\": {\"phase_questions\": \"\", \"date_limite_offres\": \"\", \
\"date_demarrage\": \"\", \"duree_initiale\": \"\", \"jalons_complementaires\": [], \
\"niveau_urgence\": \"CRITIQUE|ÉLEVÉ|STANDARD\"},
  \"engagement_contractuel\": {\"nature_juridique\": \"\", \"mode_realisation\": \"\", \
\"reconduction\": \"\", \"mode_tarification\": \"\", \"conditions_resiliation\": \"\"},
  \"technologies_competences\": {\"technologies_imposees\": [], \"profils_par_lot\": [], \
\"competences_transverses\": []},
  \"localisation\": {\"sites\": [], \"presentiel_obligatoire\": \"\", \
\"teletravail_autorise\": \"\", \"contraintes_acces\": []},
  \"penalites\": [{\"type\": \"\", \"montant\": \"\", \"plafond\": \"\", \"modalites\": \"\"}],
  \"rse\": {\"clauses_sociales\": [], \"clauses_environnementales\": [], \"labels_requis\": []},
  \"certifications\": {\"entreprise\": [], \"individuelles\": [], \"habilitations_securite\": \"\"},
  \"points_attention\": [],
  \"constitution_dossier\": {\"documents_administratifs\": [], \"memoire_technique\": {}, \
\"cv_requis\": {}},
  \"criteres_selection\": [{\"critere\": \"\", \"ponderation\": \"\", \"sous_criteres\": []}],
  \"criteres_eliminatoires\": [],
  \"processus_evaluation\": {\"etapes\": [], \"auditions\": {}, \"negociation_prevue\": \"\"},
  \"offre_financiere\": {\"documents\": [], \"variantes_autorisees\": \"\", \"revision_prix\": \"\"}
}";

const DIAGRAM_ROLE: &str = "\
You are a visual communication designer. You turn text into a clean, \
corporate diagram specification that is drawn as an editable PowerPoint \
slide.";

const DIAGRAM_RULES: &str = "\
## Diagram types
- \"process\": steps left to right or top to bottom.
- \"architecture\": layered components (front, back, data) or hub and spokes.
- \"hierarchy\": top-down tree.
- \"comparison\": mirrored columns.
- \"cycle\": nodes around a circle.
- \"timeline\": milestones left to right.

## Rules
- At most 10 nodes; labels of 2-5 words, at most 40 characters.
- Show key relationships only; dashed lines for optional ones.
- Group related nodes in containers; add annotations for key insights.
- Use the language of the input for labels.
- Coordinates are design units on a canvas 1333 wide and 650 high, origin top \
left. Default node size is 200 x 100. Keep nodes inside the canvas and apart.
- \"layer\" is the tier of a node (1 = top); it picks the node color.
- Return ONLY the JSON object, no commentary.

## Output (strict JSON)
{
  \"title\": \"Diagram title (max 60 chars)\",
  \"type\": \"process|architecture|hierarchy|comparison|cycle|timeline\",
  \"layout\": \"horizontal|vertical|circular|grid|layered\",
  \"nodes\": [
    {\"id\": \"node1\", \"label\": \"Short label\", \
\"type\": \"rectangle|rounded-rectangle|circle|diamond|cloud|cylinder|process|decision|data\", \
\"description\": \"Optional one-line detail\", \"layer\": 1, \
\"position\": {\"x\": 100, \"y\": 250}, \"size\": {\"width\": 200, \"height\": 100}}
  ],
  \"connections\": [
    {\"from\": \"node1\", \"to\": \"node2\", \"label\": \"Optional\", \
\"type\": \"arrow|double-arrow|dashed|line\", \"style\": \"solid|dashed|dotted\"}
  ],
  \"containers\": [{\"id\": \"group1\", \"label\": \"Group label\", \"nodes\": [\"node1\"]}],
  \"annotations\": [{\"text\": \"Key insight\", \"position\": {\"x\": 900, \"y\": 550}}]
}";

/// Describe the brand charter for a prompt.
fn charter(palette: &BrandPalette) -> String {
    let mut out = String::from("## Brand charter\n");
    let _ = writeln!(out, "- Primary: {}", palette.primary.css());
    let _ = writeln!(out, "- Secondary: {}", palette.secondary.css());
    let _ = writeln!(out, "- Accent: {}", palette.accent.css());
    let _ = writeln!(out, "- Dark: {}", palette.dark.css());
    let _ = writeln!(out, "- Text: {}", palette.text.css());
    let _ = writeln!(out, "- Background: {}", palette.background.css());
    let _ = writeln!(
        out,
        "- Fonts: {} for titles, {} for body, {} for subtitles",
        palette.title_font, palette.body_font, palette.caption_font
    );
    let _ = writeln!(
        out,
        "- \"{}\" wordmark bottom right and a gradient band at the top of every slide",
        palette.wordmark
    );
    let _ = writeln!(out, "- No colors outside this list");
    out
}

/// System prompt of the generator call.
pub fn generator_system(palette: &BrandPalette) -> String {
    format!(
        "{}\n\n{}\n{}\n\nNo slide may exceed {} bullets. A bullet starting with \"{}\" is a \
         sub-point of the previous bullet.",
        GENERATOR_ROLE,
        charter(palette),
        GENERATOR_RULES,
        MAX_BULLETS_PER_SLIDE,
        NESTED_BULLET_PREFIX
    )
}

/// User prompt of the generator call.
pub fn generator_user(source: &str, title: Option<&str>) -> String {
    let mut out = String::from("Build a professional presentation from the following content.\n\n");
    let _ = write!(out, "SOURCE CONTENT:\n{}\n\n", source);
    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        let _ = write!(out, "IMPOSED TITLE: {}\n\n", title);
    }
    out.push_str("Generate the complete JSON now.");
    out
}

/// System prompt of the validator call.
pub fn validator_system(palette: &BrandPalette) -> String {
    format!(
        "{}\n\n{}\n{}\n\nNo slide may exceed {} bullets.",
        VALIDATOR_ROLE,
        charter(palette),
        VALIDATOR_CHECKS,
        MAX_BULLETS_PER_SLIDE
    )
}

/// User prompt of the validator call. Markup and source are cut to
/// [`MARKUP_EXCERPT_CHARS`] and [`SOURCE_EXCERPT_CHARS`].
pub fn validator_user(markup: &str, payload_json: &str, source: &str) -> String {
    format!(
        "Validate this presentation.\n\n\
         GENERATED HTML (excerpt):\n{}\n\n\
         JSON STRUCTURE:\n{}\n\n\
         ORIGINAL SOURCE CONTENT (excerpt):\n{}\n\n\
         Check markup syntax, charter colors and fonts, coherence with the \
         request, at most {} bullets per slide, and the data attributes of \
         every slide. Respond in JSON.",
        excerpt(markup, MARKUP_EXCERPT_CHARS),
        payload_json,
        excerpt(source, SOURCE_EXCERPT_CHARS),
        MAX_BULLETS_PER_SLIDE
    )
}

/// System prompt of the tender summary call.
pub fn rfp_system() -> String {
    format!("{}\n\n{}", RFP_ROLE, RFP_RULES)
}

/// User prompt of the tender summary call.
pub fn rfp_user(document: &str) -> String {
    format!("Analyze this tender document:\n\n{}", document)
}

/// System prompt of the diagram call. Colors are not requested: the renderer
/// takes them from the palette by layer.
pub fn diagram_system(palette: &BrandPalette) -> String {
    format!("{}\n\n{}\n{}", DIAGRAM_ROLE, charter(palette), DIAGRAM_RULES)
}

/// User prompt of the diagram call.
pub fn diagram_user(description: &str) -> String {
    format!("Create a corporate diagram for this:\n\n{}", description)
}
